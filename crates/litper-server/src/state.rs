use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};

use litper_agents::{AgentCity, NovedadesService, OrdersService, RandomMetrics, TrackingService};
use litper_analytics::{DEFAULT_SLA_DAYS, classify};
use litper_assistant::{Assistant, BrainChat};
use litper_parsing::{LineReportParser, ReportParser, ShipmentBook};
use litper_store::{KeyValueStore, MemoryStore, SHIPMENTS_KEY, load_json_or_default, save_json};
use litper_types::{Country, Result, Shipment};

/// Tunables the handlers read.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub sla_days: u32,
    /// Window for `/dashboard/tendencias` when `dias` is absent.
    pub trend_days: u32,
    pub country: Country,
    pub max_chat_messages: usize,
    /// Pause before asking the assistant for a tracking summary.
    pub tracking_delay: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            sla_days: DEFAULT_SLA_DAYS,
            trend_days: 30,
            country: Country::default(),
            max_chat_messages: 20,
            tracking_delay: Duration::from_millis(800),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub shipments: Arc<RwLock<ShipmentBook>>,
    pub parser: Arc<dyn ReportParser>,
    pub novedades: Arc<NovedadesService>,
    pub orders: Arc<OrdersService>,
    pub tracking: Arc<TrackingService>,
    pub city: Arc<Mutex<AgentCity>>,
    pub chat: Arc<Mutex<BrainChat>>,
    /// Feed for a running tracking agent, if one was started.
    pub batches: Option<mpsc::Sender<Vec<Shipment>>>,
    pub settings: ServerSettings,
}

impl AppState {
    /// Build every service from what `store` already holds.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        assistant: Option<Arc<dyn Assistant>>,
        settings: ServerSettings,
    ) -> Result<Self> {
        let mut book: ShipmentBook = load_json_or_default(store.as_ref(), SHIPMENTS_KEY).await?;
        for shipment in book.iter_mut() {
            shipment.risk = Some(classify(shipment));
        }
        tracing::info!(shipments = book.len(), "loaded shipment book");

        let novedades = NovedadesService::load(store.clone()).await?;
        let orders = OrdersService::load(store.clone()).await?;
        let tracking =
            TrackingService::load(store.clone(), assistant.clone(), settings.tracking_delay)
                .await?;
        let city = AgentCity::load_or_seed(store.clone(), Box::new(RandomMetrics::from_entropy()))
            .await?;

        Ok(Self {
            store,
            shipments: Arc::new(RwLock::new(book)),
            parser: Arc::new(LineReportParser),
            novedades: Arc::new(novedades),
            orders: Arc::new(orders),
            tracking: Arc::new(tracking),
            city: Arc::new(Mutex::new(city)),
            chat: Arc::new(Mutex::new(BrainChat::new(assistant, settings.max_chat_messages))),
            batches: None,
            settings,
        })
    }

    /// Empty state over a [`MemoryStore`], with no assistant and no
    /// tracking delay.
    pub async fn in_memory() -> Result<Self> {
        let settings = ServerSettings {
            tracking_delay: Duration::ZERO,
            ..ServerSettings::default()
        };
        Self::load(Arc::new(MemoryStore::new()), None, settings).await
    }

    pub fn with_tracking_feed(mut self, batches: mpsc::Sender<Vec<Shipment>>) -> Self {
        self.batches = Some(batches);
        self
    }

    /// Current shipments, ordered by guía.
    pub async fn snapshot(&self) -> Vec<Shipment> {
        self.shipments.read().await.to_vec()
    }

    pub(crate) async fn save_book(&self, book: &ShipmentBook) -> Result<()> {
        save_json(self.store.as_ref(), SHIPMENTS_KEY, book).await
    }
}
