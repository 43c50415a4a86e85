//! Runtime settings resolved from CLI flags and environment, plus logging
//! setup.

use std::time::Duration;

use crate::cli::Cli;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub confirm_timeout: Duration,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_url: cli.api_url.clone(),
            confirm_timeout: Duration::from_millis(cli.confirm_timeout_ms.max(1)),
        }
    }
}

/// Log filter: `CATALOG_LOG`, then `RUST_LOG`, then `warn`.
pub fn log_filter() -> String {
    std::env::var("CATALOG_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string())
}

/// Logs go to stderr so tables on stdout stay pipeable.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_filter()))
        .with_writer(std::io::stderr)
        .init();
}
