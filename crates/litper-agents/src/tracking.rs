use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use litper_analytics::classify;
use litper_assistant::{Assistant, extract_json, json_str};
use litper_store::{KeyValueStore, TRACKING_KEY, load_json_or_default, save_json};
use litper_types::{AiTrackingSummary, Result, RiskLevel, Shipment, ShipmentStatus};

/// Events emitted by the tracking agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingEvent {
    /// A shipment seen for the first time is already critical.
    NewCritical { guide: String, days: u32 },
    /// A known shipment moved to a more severe tier.
    RiskEscalated {
        guide: String,
        from: RiskLevel,
        to: RiskLevel,
    },
    /// An undelivered shipment hasn't appeared in any batch for a while.
    Stale {
        guide: String,
        last_seen: DateTime<Utc>,
    },
    BatchProcessed { count: usize, critical: usize },
}

pub struct TrackingConfig {
    /// How long an undelivered shipment may go unreported before it's stale.
    pub stale_after: Duration,
    /// How often to look for stale shipments.
    pub check_interval: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(24 * 60 * 60),
            check_interval: Duration::from_secs(15 * 60),
        }
    }
}

struct Tracked {
    level: RiskLevel,
    delivered: bool,
    last_seen: DateTime<Utc>,
}

/// Receives shipment batches, classifies them and reports changes in risk.
pub struct TrackingAgent {
    batch_rx: mpsc::Receiver<Vec<Shipment>>,
    event_tx: mpsc::Sender<TrackingEvent>,
    shutdown_rx: watch::Receiver<bool>,
    config: TrackingConfig,
    tracked: HashMap<String, Tracked>,
}

impl TrackingAgent {
    pub fn new(
        batch_rx: mpsc::Receiver<Vec<Shipment>>,
        event_tx: mpsc::Sender<TrackingEvent>,
        shutdown_rx: watch::Receiver<bool>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            batch_rx,
            event_tx,
            shutdown_rx,
            config,
            tracked: HashMap::new(),
        }
    }

    /// Run until shutdown is signalled or every batch sender is gone.
    pub async fn run(mut self) {
        let mut stale_interval = tokio::time::interval(self.config.check_interval);

        loop {
            tokio::select! {
                batch = self.batch_rx.recv() => {
                    let Some(batch) = batch else {
                        tracing::info!("Tracking agent input closed");
                        break;
                    };
                    self.handle_batch(batch).await;
                }
                _ = stale_interval.tick() => {
                    self.check_stale().await;
                }
                Ok(()) = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        tracing::info!("Tracking agent shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn handle_batch(&mut self, batch: Vec<Shipment>) {
        let now = Utc::now();
        let mut critical = 0;

        for shipment in &batch {
            let risk = classify(shipment);
            if risk.level.is_critical() {
                critical += 1;
            }

            let previous = self.tracked.insert(
                shipment.id.clone(),
                Tracked {
                    level: risk.level,
                    delivered: shipment.status == ShipmentStatus::Delivered,
                    last_seen: now,
                },
            );

            let event = match previous {
                None if risk.level.is_critical() => Some(TrackingEvent::NewCritical {
                    guide: shipment.id.clone(),
                    days: shipment.days_in_transit().unwrap_or(0),
                }),
                Some(prev) if risk.level > prev.level => Some(TrackingEvent::RiskEscalated {
                    guide: shipment.id.clone(),
                    from: prev.level,
                    to: risk.level,
                }),
                _ => None,
            };
            if let Some(event) = event {
                tracing::debug!(guide = %shipment.id, level = %risk.level, "tracking event");
                let _ = self.event_tx.send(event).await;
            }
        }

        let _ = self
            .event_tx
            .send(TrackingEvent::BatchProcessed {
                count: batch.len(),
                critical,
            })
            .await;
    }

    async fn check_stale(&mut self) {
        let now = Utc::now();
        let stale_after = chrono::Duration::from_std(self.config.stale_after)
            .unwrap_or(chrono::Duration::hours(24));

        let stale: Vec<(String, DateTime<Utc>)> = self
            .tracked
            .iter()
            .filter(|(_, t)| !t.delivered && now - t.last_seen > stale_after)
            .map(|(guide, t)| (guide.clone(), t.last_seen))
            .collect();

        for (guide, last_seen) in stale {
            let _ = self
                .event_tx
                .send(TrackingEvent::Stale { guide, last_seen })
                .await;
        }
    }
}

/// Summary derived from status and events alone, used when no model
/// answer is available.
pub fn rules_tracking_summary(shipment: &Shipment) -> AiTrackingSummary {
    let risk = classify(shipment);
    let last = shipment
        .detailed_info
        .as_ref()
        .and_then(|d| d.latest_event())
        .map(|e| format!(" Último evento: {} ({}).", e.description, e.location))
        .unwrap_or_default();

    AiTrackingSummary {
        summary: format!(
            "Guía {} con {}: {}.{last}",
            shipment.id,
            shipment.carrier.display_name(),
            shipment.status
        ),
        next_step: risk.action,
        confidence: 0.5,
        generated_at: Utc::now(),
    }
}

fn tracking_prompt(shipment: &Shipment) -> String {
    let events = shipment
        .detailed_info
        .as_ref()
        .map(|d| {
            d.events
                .iter()
                .take(10)
                .map(|e| format!("- {} {} {}", e.timestamp, e.location, e.description))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    format!(
        "Analiza este envío y responde SOLO con un objeto JSON \
         {{\"summary\": string, \"next_step\": string, \"confidence\": número entre 0 y 1}}.\n\n\
         Guía: {}\nTransportadora: {}\nEstado: {}\nDías en tránsito: {}\nEventos:\n{events}",
        shipment.id,
        shipment.carrier.display_name(),
        shipment.status,
        shipment
            .days_in_transit()
            .map_or_else(|| "desconocido".to_string(), |d| d.to_string()),
    )
}

/// Ask the assistant for a tracking summary after `delay`. Missing model,
/// failed calls and unusable answers all fall back to
/// [`rules_tracking_summary`].
pub async fn refresh_ai_tracking(
    assistant: Option<&dyn Assistant>,
    shipment: &Shipment,
    delay: Duration,
) -> AiTrackingSummary {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let Some(assistant) = assistant else {
        return rules_tracking_summary(shipment);
    };

    let answer = match assistant.ask(&tracking_prompt(shipment)).await {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!(guide = %shipment.id, "tracking summary fallback: {e}");
            return rules_tracking_summary(shipment);
        }
    };

    let Some(value) = extract_json(&answer) else {
        tracing::warn!(guide = %shipment.id, "tracking summary fallback: no JSON in answer");
        return rules_tracking_summary(shipment);
    };
    let fallback = rules_tracking_summary(shipment);
    AiTrackingSummary {
        summary: json_str(&value, "summary").map_or(fallback.summary, str::to_string),
        next_step: json_str(&value, "next_step").map_or(fallback.next_step, str::to_string),
        confidence: value
            .get("confidence")
            .and_then(serde_json::Value::as_f64)
            .map_or(fallback.confidence, |c| c.clamp(0.0, 1.0)),
        generated_at: Utc::now(),
    }
}

/// Caches AI tracking summaries per guía at [`TRACKING_KEY`].
pub struct TrackingService {
    store: Arc<dyn KeyValueStore>,
    assistant: Option<Arc<dyn Assistant>>,
    delay: Duration,
    summaries: DashMap<String, AiTrackingSummary>,
}

impl TrackingService {
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        assistant: Option<Arc<dyn Assistant>>,
        delay: Duration,
    ) -> Result<Self> {
        let saved: HashMap<String, AiTrackingSummary> =
            load_json_or_default(store.as_ref(), TRACKING_KEY).await?;
        Ok(Self {
            store,
            assistant,
            delay,
            summaries: saved.into_iter().collect(),
        })
    }

    pub fn cached(&self, guide: &str) -> Option<AiTrackingSummary> {
        self.summaries.get(guide).map(|s| s.value().clone())
    }

    /// Regenerate the summary for `shipment` and store it.
    pub async fn refresh(&self, shipment: &Shipment) -> Result<AiTrackingSummary> {
        let summary = refresh_ai_tracking(self.assistant.as_deref(), shipment, self.delay).await;
        self.summaries.insert(shipment.id.clone(), summary.clone());

        let snapshot: HashMap<String, AiTrackingSummary> = self
            .summaries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        save_json(self.store.as_ref(), TRACKING_KEY, &snapshot).await?;
        Ok(summary)
    }
}
