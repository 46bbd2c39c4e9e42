//! Handler for the `bet` command group.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::SqliteBetStore;
use crate::domain::{Bet, BetId, BetStatus};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::outbound::BetStore;

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "Bet")]
    bet_id: String,
    #[tabled(rename = "User")]
    user_id: String,
    #[tabled(rename = "Stake")]
    stake: i64,
    #[tabled(rename = "Odd")]
    odd: String,
    #[tabled(rename = "Placed")]
    created_at: String,
}

fn status_label(status: BetStatus) -> String {
    match status {
        BetStatus::Confirmed => output::positive(status),
        BetStatus::Rejected => output::negative(status),
        BetStatus::PendingConfirmation => output::highlight(status),
    }
}

fn bet_json(bet: &Bet) -> serde_json::Value {
    json!({
        "betId": bet.id,
        "userId": bet.user_id,
        "eventId": bet.event_id,
        "market": bet.market,
        "selection": bet.selection,
        "stakeCents": bet.stake_cents,
        "oddValue": bet.odd_value.to_string(),
        "status": bet.status,
        "createdAt": bet.created_at,
        "updatedAt": bet.updated_at,
    })
}

/// Execute `bet status`.
pub async fn execute_status(config: &Config, bet_id: &str) -> Result<()> {
    let store = SqliteBetStore::new(bootstrap::open_database(config)?);
    let bet_id = BetId::from(bet_id);
    let Some(bet) = store.get(&bet_id).await? else {
        return Err(Error::NotFound {
            kind: "bet",
            id: bet_id.to_string(),
        });
    };
    let history = store.transitions(&bet_id).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "bet.status",
            "bet": bet_json(&bet),
            "transitions": history.iter().map(|t| json!({
                "from": t.old_status,
                "to": t.new_status,
                "reason": t.reason,
                "at": t.created_at,
            })).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::section(&format!("Bet {}", bet.id));
    output::field("Status", status_label(bet.status));
    output::field("User", &bet.user_id);
    output::field("Selection", format!("{} / {} / {}", bet.event_id, bet.market, bet.selection));
    output::field("Stake", format!("{} cents", bet.stake_cents));
    output::field("Odd", bet.odd_value);
    output::field("Placed", bet.created_at.to_rfc3339());
    if output::verbosity() > 0 || !history.is_empty() {
        output::section("Transitions");
        for transition in &history {
            let reason = transition.reason.as_deref().unwrap_or("-");
            output::note(&format!(
                "{} {} -> {} ({reason})",
                transition.created_at.to_rfc3339(),
                transition.old_status,
                transition.new_status
            ));
        }
        if history.is_empty() {
            output::note("(none)");
        }
    }
    Ok(())
}

/// Execute `bet pending`.
pub async fn execute_pending(config: &Config, limit: i64) -> Result<()> {
    let pool = bootstrap::open_database(config)?;
    let bets = SqliteBetStore::new(pool.clone())
        .pending(limit.max(1))
        .await?;
    let backlog = bootstrap::event_log(config, &pool)
        .lag(&config.worker.group, &config.bus.topics.bet_placed)
        .await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "bet.pending",
            "backlog": backlog,
            "bets": bets.iter().map(bet_json).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::section("Pending bets");
    output::field("Backlog", format!("{backlog} unconsumed {}", config.bus.topics.bet_placed));
    if bets.is_empty() {
        output::note("(none)");
        return Ok(());
    }
    let rows: Vec<PendingRow> = bets
        .into_iter()
        .map(|bet| PendingRow {
            bet_id: bet.id.to_string(),
            user_id: bet.user_id.to_string(),
            stake: bet.stake_cents,
            odd: bet.odd_value.to_string(),
            created_at: bet.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
