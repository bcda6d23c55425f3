use thiserror::Error;
use uuid::Uuid;

use crate::pedido::{PedidoEvent, PedidoStatus};

#[derive(Debug, Error)]
pub enum LitperError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Shipment not found: {0}")]
    ShipmentNotFound(String),

    #[error("Novedad not found: {0}")]
    NovedadNotFound(Uuid),

    #[error("Pedido not found: {0}")]
    PedidoNotFound(Uuid),

    #[error("Invalid pedido transition: cannot apply {event:?} to {from:?}")]
    InvalidPedidoTransition { from: PedidoStatus, event: PedidoEvent },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for LitperError {
    fn from(e: serde_json::Error) -> Self {
        LitperError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LitperError>;
