use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;

use litper_agents::TrackingConfig;
use litper_server::{AppState, serve, spawn_city_ticker, spawn_tracking_agent};

use crate::state::CliState;

/// Handle the `serve` command: API, tracking agent and city ticker until
/// Ctrl-C.
pub async fn handle(state: &CliState, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| state.config.bind_addr.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {bind}"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (batches, tracking) = spawn_tracking_agent(TrackingConfig::default(), shutdown_rx.clone());

    let app_state = AppState::load(
        state.store(),
        Some(state.assistant()),
        state.server_settings(),
    )
    .await
    .context("Failed to load service state")?
    .with_tracking_feed(batches.clone());

    // Prime the tracking agent with what is already on disk.
    let _ = batches.send(app_state.snapshot().await).await;
    drop(batches);

    let ticker = spawn_city_ticker(
        app_state.clone(),
        Duration::from_secs(state.config.city_tick_secs.max(1)),
        shutdown_rx.clone(),
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(data_dir = %state.data_dir().display(), "starting litper server");
    serve(app_state, addr, shutdown_rx).await?;

    let _ = ticker.await;
    let _ = tracking.await;
    Ok(())
}
