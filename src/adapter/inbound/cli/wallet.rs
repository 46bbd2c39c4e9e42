//! Handler for the `wallet` command group.
//!
//! Talks to the ledger tables directly; no wallet service needs to run.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::{DepositArgs, UserArg};
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::SqliteLedger;
use crate::adapter::wire::{LedgerEntryView, WalletResponse};
use crate::domain::{ExternalRef, UserId, Wallet};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::outbound::{LedgerAudit, WalletGateway};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "When")]
    at: String,
    #[tabled(rename = "Operation")]
    operation: &'static str,
    #[tabled(rename = "Cents")]
    amount: i64,
    #[tabled(rename = "Description")]
    description: String,
}

fn ledger(config: &Config) -> Result<SqliteLedger> {
    Ok(SqliteLedger::new(bootstrap::open_database(config)?))
}

fn print_wallet(command: &str, wallet: Wallet) {
    if output::is_json() {
        output::json_output(json!({
            "command": command,
            "wallet": WalletResponse::from(wallet),
        }));
        return;
    }
    output::field("User", &wallet.user_id);
    output::field("Wallet", &wallet.id);
    output::field("Balance", output::highlight(format!("{} cents", wallet.balance_cents)));
    output::field("Version", wallet.version);
}

/// Execute `wallet balance`.
pub async fn execute_balance(config: &Config, args: &UserArg) -> Result<()> {
    let wallet = ledger(config)?
        .get_or_create_wallet(&UserId::new(&args.user))
        .await?;
    print_wallet("wallet.balance", wallet);
    Ok(())
}

/// Execute `wallet deposit`.
pub async fn execute_deposit(config: &Config, args: &DepositArgs) -> Result<()> {
    let wallet = ledger(config)?
        .deposit(
            &UserId::new(&args.user.user),
            args.amount,
            &ExternalRef::new(&args.external_ref),
        )
        .await?;
    output::success(&format!("Credited {} cents", args.amount));
    print_wallet("wallet.deposit", wallet);
    Ok(())
}

/// Execute `wallet history`.
pub async fn execute_history(config: &Config, args: &UserArg) -> Result<()> {
    let entries = ledger(config)?.entries(&UserId::new(&args.user)).await?;

    if output::is_json() {
        let views: Vec<LedgerEntryView> = entries.into_iter().map(Into::into).collect();
        output::json_output(json!({
            "command": "wallet.history",
            "userId": args.user,
            "entries": views,
        }));
        return Ok(());
    }

    output::section(&format!("Ledger for {}", args.user));
    if entries.is_empty() {
        output::note("(no entries)");
        return Ok(());
    }
    let rows: Vec<EntryRow> = entries
        .into_iter()
        .map(|entry| EntryRow {
            at: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            operation: entry.operation.as_str(),
            amount: entry.amount_cents,
            description: entry.description,
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
