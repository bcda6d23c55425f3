use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::LitperError;

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PedidoStatus {
    #[default]
    Pending,
    Confirmed,
    Dispatched,
    Delivered,
    Cancelled,
    Returned,
}

/// Events that drive order state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PedidoEvent {
    Confirm,
    Dispatch,
    Deliver,
    Cancel,
    Return,
}

impl PedidoStatus {
    /// Attempt a state transition given an event.
    pub fn transition(self, event: PedidoEvent) -> super::error::Result<PedidoStatus> {
        match (self, event) {
            (PedidoStatus::Pending, PedidoEvent::Confirm) => Ok(PedidoStatus::Confirmed),
            (PedidoStatus::Pending, PedidoEvent::Cancel) => Ok(PedidoStatus::Cancelled),

            (PedidoStatus::Confirmed, PedidoEvent::Dispatch) => Ok(PedidoStatus::Dispatched),
            (PedidoStatus::Confirmed, PedidoEvent::Cancel) => Ok(PedidoStatus::Cancelled),

            (PedidoStatus::Dispatched, PedidoEvent::Deliver) => Ok(PedidoStatus::Delivered),
            (PedidoStatus::Dispatched, PedidoEvent::Return) => Ok(PedidoStatus::Returned),

            (state, event) => Err(LitperError::InvalidPedidoTransition { from: state, event }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PedidoStatus::Delivered | PedidoStatus::Cancelled | PedidoStatus::Returned
        )
    }
}

impl std::str::FromStr for PedidoEvent {
    type Err = LitperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirm" => Ok(PedidoEvent::Confirm),
            "dispatch" => Ok(PedidoEvent::Dispatch),
            "deliver" => Ok(PedidoEvent::Deliver),
            "cancel" => Ok(PedidoEvent::Cancel),
            "return" => Ok(PedidoEvent::Return),
            other => Err(LitperError::InvalidInput(format!(
                "Unknown pedido event: {other} (use confirm, dispatch, deliver, cancel, return)"
            ))),
        }
    }
}

/// A customer order handled by the orders agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pedido {
    pub id: Uuid,
    pub customer: String,
    pub phone: Option<String>,
    pub city: String,
    pub product: String,
    /// Order value in local currency.
    pub value: f64,
    pub status: PedidoStatus,
    /// Guía assigned once the order is dispatched.
    pub guide: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pedido {
    pub fn new(
        customer: impl Into<String>,
        city: impl Into<String>,
        product: impl Into<String>,
        value: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer: customer.into(),
            phone: None,
            city: city.into(),
            product: product.into(),
            value,
            status: PedidoStatus::Pending,
            guide: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Apply a state transition event.
    pub fn apply_event(&mut self, event: PedidoEvent) -> super::error::Result<()> {
        self.status = self.status.transition(event)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
