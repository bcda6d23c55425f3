//! HTTP API over the shipment book and the agent services.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use handlers::{AgentCityResponse, router};
pub use state::{AppState, ServerSettings};

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use litper_agents::{TrackingAgent, TrackingConfig, TrackingEvent};

/// Router with request tracing and permissive CORS for the dashboard.
pub fn app(state: AppState) -> Router {
    router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

/// Serve until `shutdown` flips to `true`.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "litper server listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

/// Start a tracking agent whose events are logged. Imports reach it
/// through the returned sender.
pub fn spawn_tracking_agent(
    config: TrackingConfig,
    shutdown: watch::Receiver<bool>,
) -> (mpsc::Sender<Vec<litper_types::Shipment>>, JoinHandle<()>) {
    let (batch_tx, batch_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::channel(256);

    let agent = TrackingAgent::new(batch_rx, event_tx, shutdown, config);
    let handle = tokio::spawn(async move {
        let logger = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match &event {
                    TrackingEvent::NewCritical { guide, days } => {
                        tracing::warn!(%guide, days, "critical shipment");
                    }
                    TrackingEvent::RiskEscalated { guide, from, to } => {
                        tracing::warn!(%guide, %from, %to, "shipment risk escalated");
                    }
                    TrackingEvent::Stale { guide, last_seen } => {
                        tracing::info!(%guide, %last_seen, "shipment not reported recently");
                    }
                    TrackingEvent::BatchProcessed { count, critical } => {
                        tracing::debug!(count, critical, "tracking batch processed");
                    }
                }
            }
        });
        agent.run().await;
        let _ = logger.await;
    });
    (batch_tx, handle)
}

/// Tick the agent city every `period` until shutdown.
pub fn spawn_city_ticker(
    state: AppState,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let mut city = state.city.lock().await;
                    if let Err(e) = city.tick().await {
                        tracing::warn!(error = %e, "agent city tick failed");
                    }
                }
                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}
