//! Command-line interface: argument definitions, output helpers and one
//! handler module per command group.

pub mod bet;
pub mod command;
pub mod config;
pub mod dlq;
pub mod odds;
pub mod output;
pub mod serve;
pub mod wallet;

use crate::error::Result;
use crate::infrastructure::config::Config;
use command::{
    BetCommand, Cli, ColorChoice, Commands, ConfigCommand, DlqCommand, OddsCommand, WalletCommand,
};

/// Apply global flags and run the selected command.
///
/// # Errors
/// Returns the command's error; the binary reports it and exits non-zero.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }

    if let Commands::Config(ConfigCommand::Validate) = cli.command {
        return config::execute_validate(&cli.config);
    }

    let settings = Config::load_or_default(&cli.config)?;
    if matches!(cli.command, Commands::Serve { .. } | Commands::Worker) {
        settings.init_logging();
    }

    match cli.command {
        Commands::Serve { service } => serve::execute_serve(&settings, service).await,
        Commands::Worker => serve::execute_worker(&settings).await,
        Commands::Migrate => serve::execute_migrate(&settings),
        Commands::Wallet(WalletCommand::Balance(args)) => {
            wallet::execute_balance(&settings, &args).await
        }
        Commands::Wallet(WalletCommand::Deposit(args)) => {
            wallet::execute_deposit(&settings, &args).await
        }
        Commands::Wallet(WalletCommand::History(args)) => {
            wallet::execute_history(&settings, &args).await
        }
        Commands::Bet(BetCommand::Status { bet_id }) => bet::execute_status(&settings, &bet_id).await,
        Commands::Bet(BetCommand::Pending { limit }) => {
            bet::execute_pending(&settings, limit).await
        }
        Commands::Odds(OddsCommand::Set(args)) => odds::execute_set(&settings, &args).await,
        Commands::Dlq(DlqCommand::List { topic }) => {
            dlq::execute_list(&settings, topic.as_deref()).await
        }
        Commands::Config(ConfigCommand::Show) => config::execute_show(&settings),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&cli.config),
    }
}
