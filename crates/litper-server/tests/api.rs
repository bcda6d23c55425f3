use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use async_trait::async_trait;
use litper_server::{AppState, ServerSettings, app};
use litper_store::{KeyValueStore, MemoryStore};
use litper_types::{LitperError, Result};

/// Two delivered, one fresh in transit, one six days in office, one issue.
const SHEET: &str = "GUIA\tESTADO\tTELEFONO\tTRANSPORTADORA\tDESTINO\tDIAS\n\
                     100000001\tENTREGADO\t3001111111\tInterrapidísimo\tMedellín\t2\n\
                     100000002\tENTREGADO\t3002222222\tEnvía\tCali\t3\n\
                     100000003\tEN TRANSITO\t\tCoordinadora\tBogotá\t1\n\
                     100000004\tEN OFICINA\t\tEnvía\tPasto\t6\n\
                     100000005\tNOVEDAD\t\tTCC\tCali\t2\n";

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn loaded_app() -> Router {
    let app = app(AppState::in_memory().await.unwrap());
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": SHEET, "format": "table" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["created"], 5);
    app
}

#[tokio::test]
async fn test_health() {
    let app = app(AppState::in_memory().await.unwrap());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_summary_after_import() {
    let app = loaded_app().await;
    let (status, summary) = send(&app, "GET", "/dashboard/resumen", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 5);
    assert_eq!(summary["delivery_rate"], 40);
    assert_eq!(summary["critical_count"], 1);
    assert_eq!(summary["issue_count"], 1);
}

#[tokio::test]
async fn test_trends_window() {
    let app = loaded_app().await;
    let (_, points) = send(&app, "GET", "/dashboard/tendencias?dias=7", None).await;
    let points = points.as_array().unwrap();
    assert_eq!(points.len(), 7);
    // Everything was imported today.
    assert_eq!(points[6]["total"], 5);
}

#[tokio::test]
async fn test_shipment_filters() {
    let app = loaded_app().await;

    let (_, urgent) = send(&app, "GET", "/api/v1/shipments?risk=URGENT", None).await;
    let urgent = urgent.as_array().unwrap();
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0]["id"], "100000004");
    let (status, critical) = send(&app, "GET", "/api/v1/shipments?risk=CRITICAL", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(critical, Value::Array(urgent.clone()));

    let (_, envia) = send(&app, "GET", "/api/v1/shipments?carrier=ENVIA", None).await;
    assert_eq!(envia.as_array().unwrap().len(), 2);

    let (_, cali) = send(&app, "GET", "/api/v1/shipments?city=cali", None).await;
    assert_eq!(cali.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_shipment_lookup_and_risk() {
    let app = loaded_app().await;

    let (status, risk) = send(&app, "GET", "/api/v1/shipments/100000004/risk", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(risk["level"], "URGENT");

    let (status, body) = send(&app, "GET", "/api/v1/shipments/999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("999999999"));
}

#[tokio::test]
async fn test_alerts_most_severe_first() {
    let app = loaded_app().await;
    let (_, alerts) = send(&app, "GET", "/api/v1/alerts", None).await;
    let guides: Vec<&str> = alerts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["guide"].as_str().unwrap())
        .collect();
    assert_eq!(guides, vec!["100000004", "100000005"]);
}

#[tokio::test]
async fn test_phone_list_import() {
    let app = loaded_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": "100000004 312 345 6789", "format": "phones" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["phones_attached"], 1);

    let (_, shipment) = send(&app, "GET", "/api/v1/shipments/100000004", None).await;
    assert_eq!(shipment["phone"], "3123456789");
}

#[tokio::test]
async fn test_import_rejects_empty_text_and_bad_sheet() {
    let app = app(AppState::in_memory().await.unwrap());
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": "ESTADO,TELEFONO\nENTREGADO,3001234567", "format": "table" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_novedad_detect_and_resolve() {
    let app = loaded_app().await;

    let (status, created) = send(&app, "POST", "/api/v1/novedades/detect", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = created.as_array().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["guide"], "100000005");
    let id = created[0]["id"].as_str().unwrap().to_string();

    // A second detection doesn't duplicate the open novedad.
    let (_, again) = send(&app, "POST", "/api/v1/novedades/detect", None).await;
    assert!(again.as_array().unwrap().is_empty());

    let uri = format!("/api/v1/novedades/{id}/resolve");
    let body = json!({ "resolution": "Cliente confirmó nueva dirección" });
    let (status, resolved) = send(&app, "POST", &uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");

    let (status, _) = send(&app, "POST", &uri, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pedido_lifecycle_errors() {
    let app = app(AppState::in_memory().await.unwrap());
    let (status, pedido) = send(
        &app,
        "POST",
        "/api/v1/pedidos",
        Some(json!({
            "customer": "Ana Torres",
            "city": "Cali",
            "product": "Zapatos",
            "value": 129900.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = pedido["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/pedidos/{id}/transition");
    let (status, _) = send(&app, "POST", &uri, Some(json!({ "event": "deliver" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, confirmed) = send(&app, "POST", &uri, Some(json!({ "event": "confirm" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    let missing = format!("/api/v1/pedidos/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "GET", &missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_intents() {
    let app = loaded_app().await;

    let (status, reply) = send(&app, "POST", "/api/v1/chat", Some(json!({ "message": "hola" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["intent"], "greeting");

    let (_, reply) = send(
        &app,
        "POST",
        "/api/v1/chat",
        Some(json!({ "message": "¿Cuál es la tasa de entrega?" })),
    )
    .await;
    assert_eq!(reply["intent"], "delivery_rate");
    assert!(reply["reply"].as_str().unwrap().contains("40"));

    let (status, _) = send(&app, "POST", "/api/v1/chat", Some(json!({ "message": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_agent_city_tick() {
    let app = app(AppState::in_memory().await.unwrap());
    let (_, city) = send(&app, "GET", "/api/v1/agents/city", None).await;
    assert_eq!(city["stats"]["districts"], 4);

    let (status, stats) = send(&app, "POST", "/api/v1/agents/city/tick", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["ticks"], 1);
}

#[tokio::test]
async fn test_book_survives_restart() {
    let store = Arc::new(MemoryStore::new());
    let settings = ServerSettings::default();
    let first = app(AppState::load(store.clone(), None, settings.clone()).await.unwrap());
    let (status, _) = send(
        &first,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": SHEET, "format": "table" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let second = app(AppState::load(store, None, settings).await.unwrap());
    let (_, summary) = send(&second, "GET", "/dashboard/resumen", None).await;
    assert_eq!(summary["total"], 5);
    assert_eq!(summary["critical_count"], 1);
}

/// Memory store whose writes start failing once `fail_writes` is set.
#[derive(Default)]
struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LitperError::Store(format!("disk full writing {key}")));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }
}

#[tokio::test]
async fn test_failed_save_leaves_book_unchanged() {
    let store = Arc::new(FailingStore::default());
    let app = app(AppState::load(store.clone(), None, ServerSettings::default()).await.unwrap());
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": SHEET, "format": "table" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    store.fail_writes.store(true, Ordering::SeqCst);
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/shipments/import",
        Some(json!({ "text": "100000009 | ENTREGADO | CALI", "format": "report" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("disk full"));

    let (_, list) = send(&app, "GET", "/api/v1/shipments", None).await;
    assert_eq!(list.as_array().unwrap().len(), 5);
    let (status, _) = send(&app, "GET", "/api/v1/shipments/100000009", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
