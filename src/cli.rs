use clap::{Parser, Subcommand, ValueHint};
use lookup_core::Markup;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Token contract and ticker lookups")]
pub struct Cli {
    #[command(subcommand)]
    pub(crate) cmd: Command,

    /// Output markup (markdown | html | plain)
    #[arg(long, default_value = "markdown", global = true)]
    pub(crate) markup: Markup,

    /// Configuration file; defaults and env vars apply when it is missing
    #[arg(long, value_hint = ValueHint::FilePath, default_value = "config.toml", global = true)]
    pub(crate) config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Look up a contract on a named chain
    Price {
        /// ethereum | base | solana | sui | abstract (aliases: eth, sol, abs)
        chain: String,
        address: String,
    },

    /// Look up a contract, guessing the chain from the address
    Scan { address: String },

    /// Market data for a listed coin
    Ticker { symbol: String },
}
