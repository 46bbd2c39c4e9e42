//! Command-line interface definitions.
//!
//! One binary runs every process of the settlement saga (`serve ...`,
//! `worker`) and carries the operator commands used to inspect and seed
//! the shared database.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::infrastructure::config::DEFAULT_CONFIG_PATH;

/// Bet settlement services and operator tools
#[derive(Parser, Debug)]
#[command(name = "betsettle")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (defaults apply when it is missing)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one of the HTTP services in the foreground
    Serve {
        #[arg(value_enum)]
        service: Service,
    },

    /// Run the confirmation worker in the foreground
    Worker,

    /// Apply pending database migrations
    Migrate,

    /// Inspect or fund wallets
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Inspect bets
    #[command(subcommand)]
    Bet(BetCommand),

    /// Manage the odds snapshot cache
    #[command(subcommand)]
    Odds(OddsCommand),

    /// Inspect dead-letter topics
    #[command(subcommand)]
    Dlq(DlqCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Services started by `betsettle serve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Service {
    /// Wallet ledger
    Wallet,
    /// Bet placement
    Bets,
    /// Supplier simulator
    Supplier,
}

#[derive(Args, Debug)]
pub struct UserArg {
    /// User the wallet belongs to
    #[arg(short, long)]
    pub user: String,
}

/// Subcommands for `betsettle wallet`.
#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Show balance and version (opens the wallet if needed)
    Balance(UserArg),
    /// Credit funds
    Deposit(DepositArgs),
    /// Show the ledger trail, oldest first
    History(UserArg),
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    #[command(flatten)]
    pub user: UserArg,
    /// Amount in cents
    #[arg(short, long)]
    pub amount: i64,
    /// External reference recorded on the ledger line
    #[arg(long = "ref", default_value = "")]
    pub external_ref: String,
}

/// Subcommands for `betsettle bet`.
#[derive(Subcommand, Debug)]
pub enum BetCommand {
    /// Show a bet and its transition history
    Status {
        /// Bet id
        bet_id: String,
    },
    /// List bets still awaiting a verdict, oldest first
    Pending {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

/// Subcommands for `betsettle odds`.
#[derive(Subcommand, Debug)]
pub enum OddsCommand {
    /// Store the current odd for a selection
    Set(OddsSetArgs),
}

#[derive(Args, Debug)]
pub struct OddsSetArgs {
    #[arg(long)]
    pub event: String,
    #[arg(long)]
    pub market: String,
    #[arg(long)]
    pub selection: String,
    #[arg(long)]
    pub odd: Decimal,
}

/// Subcommands for `betsettle dlq`.
#[derive(Subcommand, Debug)]
pub enum DlqCommand {
    /// List dead-lettered messages
    List {
        /// Only this topic (both dead-letter topics by default)
        #[arg(long)]
        topic: Option<String>,
    },
}

/// Subcommands for `betsettle config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file for correctness
    Validate,
    /// Display the effective configuration with defaults applied
    Show,
}
