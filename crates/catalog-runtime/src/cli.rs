//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

use catalog_client::DEFAULT_API_URL;
use catalog_core::{DEFAULT_CONFIRM_TIMEOUT_MS, EntityKind};

#[derive(Debug, Parser)]
#[command(name = "catalog-admin", about = "Music catalog admin client")]
pub struct Cli {
    /// Base address of the catalog REST API
    #[arg(long, global = true, env = "CATALOG_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// How long an armed action waits for its confirmation, in milliseconds
    #[arg(
        long,
        global = true,
        env = "CATALOG_CONFIRM_TIMEOUT_MS",
        default_value_t = DEFAULT_CONFIRM_TIMEOUT_MS
    )]
    pub confirm_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive admin session (default)
    Shell,
    /// Print the albums table
    Albums,
    /// Print the songs table
    Songs,
    /// Delete an album or song after an interactive confirmation
    Delete(DeleteOpts),
}

#[derive(Debug, clap::Args)]
pub struct DeleteOpts {
    /// `album` or `song`
    pub kind: EntityKind,
    pub id: i64,
}
