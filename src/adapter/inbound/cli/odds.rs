//! Handler for the `odds` command group.

use serde_json::json;

use crate::adapter::inbound::cli::command::OddsSetArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::SqliteOddsCache;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::{Config, OddsBackend};
use crate::port::outbound::OddsKey;

/// Execute `odds set`.
pub async fn execute_set(config: &Config, args: &OddsSetArgs) -> Result<()> {
    let cache = SqliteOddsCache::new(bootstrap::open_database(config)?);
    let key = OddsKey::new(&args.event, &args.market, &args.selection);
    cache.put(&key, args.odd).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "odds.set",
            "key": key.to_string(),
            "odd": args.odd.to_string(),
        }));
        return Ok(());
    }

    output::success(&format!("Stored {key} = {}", args.odd));
    if config.odds.backend != OddsBackend::Sqlite {
        output::warning("Bet placement is not configured to read odds from the database");
    }
    Ok(())
}
