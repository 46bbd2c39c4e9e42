//! Handler for the `dlq` command group.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::outbound::Message;

#[derive(Tabled)]
struct DlqRow {
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Partition")]
    partition: i32,
    #[tabled(rename = "Offset")]
    offset: i64,
    #[tabled(rename = "Key")]
    key: String,
}

/// Execute `dlq list`.
pub async fn execute_list(config: &Config, topic: Option<&str>) -> Result<()> {
    let pool = bootstrap::open_database(config)?;
    let log = bootstrap::event_log(config, &pool);
    let topics = &config.bus.topics;
    let names: Vec<&str> = match topic {
        Some(name) => vec![name],
        None => vec![
            topics.bet_placed_dlq.as_str(),
            topics.bet_confirmed_dlq.as_str(),
        ],
    };

    let mut messages: Vec<Message> = Vec::new();
    for name in names {
        messages.extend(log.messages(name).await?);
    }

    if output::is_json() {
        output::json_output(json!({
            "command": "dlq.list",
            "messages": messages.iter().map(|m| json!({
                "topic": m.topic,
                "partition": m.partition,
                "offset": m.offset,
                "key": m.key,
                "payload": serde_json::from_str::<serde_json::Value>(&m.payload)
                    .unwrap_or_else(|_| serde_json::Value::String(m.payload.clone())),
            })).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::section("Dead-lettered messages");
    if messages.is_empty() {
        output::success("No dead-lettered messages");
        return Ok(());
    }
    if output::verbosity() > 0 {
        for message in &messages {
            output::note(&format!("{} #{}: {}", message.topic, message.offset, message.payload));
        }
    }
    let rows: Vec<DlqRow> = messages
        .into_iter()
        .map(|m| DlqRow {
            topic: m.topic,
            partition: m.partition,
            offset: m.offset,
            key: m.key,
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
