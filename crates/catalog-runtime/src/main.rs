//! catalog-admin: terminal admin client for the music catalog REST API.

use std::io::IsTerminal;
use std::sync::Arc;

use catalog_client::{CatalogApi, CatalogClient};
use catalog_runtime::cli::{Cli, Command};
use catalog_runtime::config::{self, Settings};
use catalog_runtime::{cmd_delete, cmd_list, shell};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    config::init_logging();

    let settings = Settings::from_cli(&args);
    tracing::debug!(api_url = %settings.api_url, timeout = ?settings.confirm_timeout, "starting");

    let api: Arc<dyn CatalogApi> = Arc::new(CatalogClient::new(&settings.api_url)?);

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let prompt = std::io::stdin().is_terminal();
            let mut session =
                shell::Shell::new(api, settings.confirm_timeout, std::io::stdout());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&mut session, stdin, prompt).await?;
        }
        Command::Albums => cmd_list::cmd_albums(api.as_ref()).await?,
        Command::Songs => cmd_list::cmd_songs(api.as_ref()).await?,
        Command::Delete(opts) => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let exit_code = cmd_delete::cmd_delete(
                api,
                opts.kind,
                opts.id,
                settings.confirm_timeout,
                stdin,
                &mut std::io::stdout(),
            )
            .await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }
    Ok(())
}
