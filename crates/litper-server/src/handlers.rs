use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use litper_agents::{
    AgentCityState, AgentCityStats, NewPedido, NovedadStats, OrderStats, ResponsePlan,
};
use litper_analytics::{
    Alert, DashboardSummary, ShipmentFilter, TrendPoint, classify, critical_alerts, trends,
};
use litper_assistant::{ChatContext, ChatReply};
use litper_parsing::{ImportFormat, ImportReport, ParseDefaults, import_text};
use litper_types::{
    AiTrackingSummary, Carrier, Country, LitperError, Novedad, Pedido, PedidoEvent, Shipment,
    ShipmentRisk,
};

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dashboard/resumen", get(dashboard_summary))
        .route("/dashboard/tendencias", get(dashboard_trends))
        .route("/api/v1/shipments", get(list_shipments))
        .route("/api/v1/shipments/import", post(import_shipments))
        .route("/api/v1/shipments/{id}", get(get_shipment))
        .route("/api/v1/shipments/{id}/risk", get(get_shipment_risk))
        .route("/api/v1/shipments/{id}/tracking", post(refresh_tracking))
        .route("/api/v1/alerts", get(list_alerts))
        .route("/api/v1/novedades", get(list_novedades))
        .route("/api/v1/novedades/detect", post(detect_novedades))
        .route("/api/v1/novedades/stats", get(novedad_stats))
        .route("/api/v1/novedades/{id}/plan", get(novedad_plan))
        .route("/api/v1/novedades/{id}/start", post(start_novedad))
        .route("/api/v1/novedades/{id}/resolve", post(resolve_novedad))
        .route("/api/v1/novedades/{id}/escalate", post(escalate_novedad))
        .route("/api/v1/pedidos", post(create_pedido).get(list_pedidos))
        .route("/api/v1/pedidos/stats", get(pedido_stats))
        .route("/api/v1/pedidos/{id}", get(get_pedido))
        .route("/api/v1/pedidos/{id}/transition", post(transition_pedido))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/agents/city", get(agent_city))
        .route("/api/v1/agents/city/tick", post(tick_agent_city))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

// Dashboard

async fn dashboard_summary(State(state): State<AppState>) -> Json<DashboardSummary> {
    let shipments = state.snapshot().await;
    Json(DashboardSummary::compute(&shipments, state.settings.sla_days))
}

#[derive(Deserialize)]
struct TrendQuery {
    dias: Option<u32>,
}

async fn dashboard_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Json<Vec<TrendPoint>> {
    let shipments = state.snapshot().await;
    let days = query.dias.unwrap_or(state.settings.trend_days);
    Json(trends(&shipments, days, Utc::now().date_naive()))
}

// Shipments

#[derive(Deserialize)]
struct ImportRequest {
    text: String,
    #[serde(default)]
    format: ImportFormat,
    #[serde(default)]
    carrier: Option<Carrier>,
    #[serde(default)]
    country: Option<Country>,
}

async fn import_shipments(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<ImportReport> {
    if req.text.trim().is_empty() {
        return Err(LitperError::InvalidInput("Nothing to import".to_string()).into());
    }
    let defaults = ParseDefaults {
        carrier: req.carrier.unwrap_or(Carrier::Unknown),
        country: req.country.unwrap_or(state.settings.country),
        ..ParseDefaults::default()
    };

    // Import into a copy; the live book only changes once the save went through.
    let (report, batch) = {
        let mut book = state.shipments.write().await;
        let mut staged = book.clone();
        let report = import_text(
            &mut staged,
            state.parser.as_ref(),
            req.format,
            &req.text,
            &defaults,
        )?;
        for shipment in staged.iter_mut() {
            shipment.risk = Some(classify(shipment));
        }
        state.save_book(&staged).await?;
        let batch = staged.to_vec();
        *book = staged;
        (report, batch)
    };

    if let Some(batches) = &state.batches {
        if batches.try_send(batch).is_err() {
            tracing::warn!("tracking agent busy, batch skipped");
        }
    }
    tracing::info!(
        format = ?report.format,
        created = report.created,
        updated = report.updated,
        warnings = report.warnings.len(),
        "shipments imported"
    );
    Ok(Json(report))
}

async fn list_shipments(
    State(state): State<AppState>,
    Query(filter): Query<ShipmentFilter>,
) -> Json<Vec<Shipment>> {
    let shipments = state.snapshot().await;
    Json(filter.apply(&shipments).into_iter().cloned().collect())
}

/// Look up a guía as typed, then upper-cased.
async fn find_shipment(state: &AppState, id: &str) -> Result<Shipment, ApiError> {
    let book = state.shipments.read().await;
    book.get(id)
        .or_else(|| book.get(&id.trim().to_ascii_uppercase()))
        .cloned()
        .ok_or_else(|| LitperError::ShipmentNotFound(id.to_string()).into())
}

async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Shipment> {
    Ok(Json(find_shipment(&state, &id).await?))
}

async fn get_shipment_risk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ShipmentRisk> {
    let shipment = find_shipment(&state, &id).await?;
    Ok(Json(classify(&shipment)))
}

async fn refresh_tracking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AiTrackingSummary> {
    let shipment = find_shipment(&state, &id).await?;
    let summary = state.tracking.refresh(&shipment).await?;

    let mut book = state.shipments.write().await;
    let mut staged = book.clone();
    if let Some(stored) = staged.get_mut(&shipment.id) {
        stored.ai_tracking = Some(summary.clone());
    }
    state.save_book(&staged).await?;
    *book = staged;
    Ok(Json(summary))
}

async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    let shipments = state.snapshot().await;
    Json(critical_alerts(&shipments))
}

// Novedades

async fn detect_novedades(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Novedad>>), ApiError> {
    let shipments = state.snapshot().await;
    let created = state.novedades.detect(&shipments).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_novedades(State(state): State<AppState>) -> Json<Vec<Novedad>> {
    Json(state.novedades.list())
}

async fn novedad_stats(State(state): State<AppState>) -> Json<NovedadStats> {
    Json(state.novedades.stats())
}

async fn novedad_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ResponsePlan> {
    Ok(Json(state.novedades.plan(id)?))
}

async fn start_novedad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Novedad> {
    Ok(Json(state.novedades.start(id).await?))
}

#[derive(Deserialize)]
struct ResolveRequest {
    resolution: String,
}

async fn resolve_novedad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResolveRequest>,
) -> ApiResult<Novedad> {
    Ok(Json(state.novedades.resolve(id, req.resolution).await?))
}

#[derive(Deserialize)]
struct EscalateRequest {
    reason: String,
}

async fn escalate_novedad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EscalateRequest>,
) -> ApiResult<Novedad> {
    Ok(Json(state.novedades.escalate(id, req.reason).await?))
}

// Pedidos

async fn create_pedido(
    State(state): State<AppState>,
    Json(req): Json<NewPedido>,
) -> Result<(StatusCode, Json<Pedido>), ApiError> {
    let pedido = state.orders.create(req).await?;
    Ok((StatusCode::CREATED, Json(pedido)))
}

async fn list_pedidos(State(state): State<AppState>) -> Json<Vec<Pedido>> {
    Json(state.orders.list())
}

async fn pedido_stats(State(state): State<AppState>) -> Json<OrderStats> {
    Json(state.orders.stats())
}

async fn get_pedido(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Pedido> {
    Ok(Json(state.orders.get(id)?))
}

#[derive(Deserialize)]
struct TransitionRequest {
    event: PedidoEvent,
    #[serde(default)]
    guide: Option<String>,
}

async fn transition_pedido(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Pedido> {
    Ok(Json(state.orders.transition(id, req.event, req.guide).await?))
}

// Chat

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> ApiResult<ChatReply> {
    if req.message.trim().is_empty() {
        return Err(LitperError::InvalidInput("Empty message".to_string()).into());
    }
    let shipments = state.snapshot().await;
    let context = ChatContext {
        shipments: &shipments,
        open_novedades: state.novedades.open_count(),
        sla_days: state.settings.sla_days,
    };
    let mut brain = state.chat.lock().await;
    Ok(Json(brain.respond(&req.message, &context).await))
}

// Agent city

#[derive(Serialize, Deserialize)]
pub struct AgentCityResponse {
    pub state: AgentCityState,
    pub stats: AgentCityStats,
}

async fn agent_city(State(state): State<AppState>) -> Json<AgentCityResponse> {
    let city = state.city.lock().await;
    Json(AgentCityResponse {
        state: city.state().clone(),
        stats: city.stats(),
    })
}

async fn tick_agent_city(State(state): State<AppState>) -> ApiResult<AgentCityStats> {
    let mut city = state.city.lock().await;
    Ok(Json(city.tick().await?))
}
