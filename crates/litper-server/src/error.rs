use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use litper_types::LitperError;

/// Handler error rendered as `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub LitperError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LitperError::ShipmentNotFound(_)
            | LitperError::NovedadNotFound(_)
            | LitperError::PedidoNotFound(_) => StatusCode::NOT_FOUND,
            LitperError::Parse(_)
            | LitperError::InvalidInput(_)
            | LitperError::InvalidPedidoTransition { .. } => StatusCode::BAD_REQUEST,
            LitperError::Store(_)
            | LitperError::Serialization(_)
            | LitperError::Assistant(_)
            | LitperError::Backend(_)
            | LitperError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LitperError> for ApiError {
    fn from(e: LitperError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
