use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use litper_store::{KeyValueStore, PEDIDOS_KEY, load_json_or_default, save_json};
use litper_types::{LitperError, Pedido, PedidoEvent, PedidoStatus, Result};

/// Input for a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPedido {
    pub customer: String,
    pub city: String,
    pub product: String,
    pub value: f64,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub dispatched: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub returned: usize,
    /// Sum of delivered order values.
    pub delivered_value: f64,
}

/// Order lifecycle, persisted at [`PEDIDOS_KEY`].
pub struct OrdersService {
    store: Arc<dyn KeyValueStore>,
    pedidos: DashMap<Uuid, Pedido>,
}

impl OrdersService {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let saved: Vec<Pedido> = load_json_or_default(store.as_ref(), PEDIDOS_KEY).await?;
        tracing::debug!(count = saved.len(), "loaded pedidos");
        Ok(Self {
            store,
            pedidos: saved.into_iter().map(|p| (p.id, p)).collect(),
        })
    }

    pub async fn create(&self, input: NewPedido) -> Result<Pedido> {
        if input.customer.trim().is_empty() || input.product.trim().is_empty() {
            return Err(LitperError::InvalidInput(
                "customer and product are required".to_string(),
            ));
        }
        if !input.value.is_finite() || input.value < 0.0 {
            return Err(LitperError::InvalidInput(format!(
                "Invalid order value: {}",
                input.value
            )));
        }

        let mut pedido = Pedido::new(input.customer.trim(), input.city.trim(), input.product.trim(), input.value);
        pedido.phone = input.phone.filter(|p| !p.trim().is_empty());
        tracing::info!(id = %pedido.id, customer = %pedido.customer, "pedido created");
        self.pedidos.insert(pedido.id, pedido.clone());
        self.persist().await?;
        Ok(pedido)
    }

    pub fn get(&self, id: Uuid) -> Result<Pedido> {
        self.pedidos
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or(LitperError::PedidoNotFound(id))
    }

    /// All orders, oldest first.
    pub fn list(&self) -> Vec<Pedido> {
        let mut list: Vec<Pedido> = self.pedidos.iter().map(|p| p.value().clone()).collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        list
    }

    /// Apply a lifecycle event. A guía may be attached on dispatch.
    pub async fn transition(
        &self,
        id: Uuid,
        event: PedidoEvent,
        guide: Option<String>,
    ) -> Result<Pedido> {
        let updated = {
            let mut entry = self
                .pedidos
                .get_mut(&id)
                .ok_or(LitperError::PedidoNotFound(id))?;
            let from = entry.status;
            entry.apply_event(event)?;
            if event == PedidoEvent::Dispatch {
                if let Some(guide) = guide.filter(|g| !g.trim().is_empty()) {
                    entry.guide = Some(guide.trim().to_ascii_uppercase());
                }
            }
            tracing::info!(%id, ?from, to = ?entry.status, "pedido transition");
            entry.value().clone()
        };
        self.persist().await?;
        Ok(updated)
    }

    pub fn stats(&self) -> OrderStats {
        let mut stats = OrderStats::default();
        for p in self.pedidos.iter() {
            stats.total += 1;
            match p.status {
                PedidoStatus::Pending => stats.pending += 1,
                PedidoStatus::Confirmed => stats.confirmed += 1,
                PedidoStatus::Dispatched => stats.dispatched += 1,
                PedidoStatus::Delivered => {
                    stats.delivered += 1;
                    stats.delivered_value += p.value;
                }
                PedidoStatus::Cancelled => stats.cancelled += 1,
                PedidoStatus::Returned => stats.returned += 1,
            }
        }
        stats
    }

    async fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), PEDIDOS_KEY, &self.list()).await
    }
}
