mod backend;
mod cli;
mod commands;
mod config;
mod output;
mod state;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use litper_store::FileStore;

use crate::cli::{Cli, Commands};
use crate::config::LitperConfig;
use crate::state::CliState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(FileStore::default_state_dir);
    let config = LitperConfig::load(&config_dir)?;
    init_tracing(&config);

    let state = CliState::new(config, config_dir);

    match cli.command {
        Commands::Import {
            path,
            format,
            carrier,
            country,
        } => {
            commands::import::handle(&state, &path, format, carrier.as_deref(), country).await?;
        }
        Commands::Status { local, trends } => commands::status::handle(&state, local, trends).await?,
        Commands::Risk { level, limit } => commands::shipments::risk(&state, level, limit).await?,
        Commands::Shipment { guide, refresh } => {
            commands::shipments::show(&state, &guide, refresh).await?
        }
        Commands::Novedades { action } => commands::novedades::handle(&state, action).await?,
        Commands::Pedidos { action } => commands::pedidos::handle(&state, action).await?,
        Commands::Ask { message, no_llm } => {
            commands::ask::handle(&state, &message.join(" "), no_llm).await?
        }
        Commands::Serve { bind } => commands::serve::handle(&state, bind).await?,
        Commands::City { ticks } => commands::city::handle(&state, ticks).await?,
        Commands::Config { action } => commands::config::handle(action, &state.config_dir).await?,
    }
    Ok(())
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG`
/// overrides the default `info` level.
fn init_tracing(config: &LitperConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json_logs() {
        builder.json().init();
    } else {
        builder.init();
    }
}
