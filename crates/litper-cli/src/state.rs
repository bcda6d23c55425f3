use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use litper_analytics::classify;
use litper_assistant::{Assistant, CliAssistant};
use litper_parsing::ShipmentBook;
use litper_server::ServerSettings;
use litper_store::{FileStore, KeyValueStore, SHIPMENTS_KEY, load_json_or_default, save_json};

use crate::backend::BackendClient;
use crate::config::LitperConfig;

/// Shared state for CLI commands.
pub struct CliState {
    pub config: LitperConfig,
    pub config_dir: PathBuf,
    pub store: Arc<FileStore>,
}

impl CliState {
    pub fn new(config: LitperConfig, config_dir: PathBuf) -> Self {
        let store = Arc::new(FileStore::new(config.data_dir(&config_dir)));
        Self {
            config,
            config_dir,
            store,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// The saved shipment book with fresh risk on every shipment.
    pub async fn load_book(&self) -> Result<ShipmentBook> {
        let mut book: ShipmentBook =
            load_json_or_default(self.store.as_ref(), SHIPMENTS_KEY).await?;
        for shipment in book.iter_mut() {
            shipment.risk = Some(classify(shipment));
        }
        Ok(book)
    }

    pub async fn save_book(&self, book: &ShipmentBook) -> Result<()> {
        save_json(self.store.as_ref(), SHIPMENTS_KEY, book).await?;
        Ok(())
    }

    pub fn assistant(&self) -> Arc<dyn Assistant> {
        Arc::new(
            CliAssistant::new(self.config.assistant_command.clone())
                .with_model(&self.config.assistant_model),
        )
    }

    /// Client for the configured backend, if any.
    pub fn backend(&self) -> Result<Option<BackendClient>> {
        let Some(url) = self.config.api_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let timeout = Duration::from_millis(self.config.backend_timeout_ms);
        Ok(Some(BackendClient::new(url, timeout)?))
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            sla_days: self.config.sla_days,
            trend_days: self.config.trend_days,
            country: self.config.default_country,
            max_chat_messages: self.config.max_chat_messages,
            ..ServerSettings::default()
        }
    }
}
