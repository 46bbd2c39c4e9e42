//! Inbound adapters (driving side): HTTP servers and the CLI.

pub mod cli;
pub mod http;
