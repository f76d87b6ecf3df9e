/*
[INPUT]:  CLI configuration and subcommand arguments
[OUTPUT]: Wallet bridge command implementations
[POS]:    Crate root - module wiring for the wallet-bridge binary
[UPDATE]: When adding modules
*/

pub mod commands;
pub mod config;

pub use config::{AppSection, CliConfig, WalletSection};
