use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use litper_parsing::fold_accents;
use litper_store::{KeyValueStore, NOVEDADES_KEY, load_json_or_default, save_json};
use litper_types::{
    LitperError, Novedad, NovedadKind, NovedadStatus, Result, Shipment, ShipmentStatus,
};

use crate::response::{ContactChannel, ResponseAction, ResponsePlan};

/// Contact attempts before a novedad is handed to a human.
pub const MAX_ATTEMPTS: u32 = 3;

/// Infer the exception category from the carrier's status text.
pub fn classify_kind(text: &str) -> NovedadKind {
    let folded = fold_accents(text);
    let has = |words: &[&str]| words.iter().any(|w| folded.contains(w));

    if has(&["DIRECCION", "NO EXISTE", "NOMENCLATURA", "BARRIO"]) {
        NovedadKind::DireccionErrada
    } else if has(&["AUSENTE", "NO SE ENCONTR", "NADIE", "CERRADO"]) {
        NovedadKind::ClienteAusente
    } else if has(&["RECHAZ", "REHUS", "NO ACEPT"]) {
        NovedadKind::Rechazado
    } else if has(&["ZONA", "ACCESO", "ORDEN PUBLICO", "RURAL"]) {
        NovedadKind::ZonaDificilAcceso
    } else if has(&["DEVOLU", "DEVUELT", "RETORNO"]) {
        NovedadKind::Devolucion
    } else {
        NovedadKind::Otro
    }
}

/// Map a novedad to the steps that should clear it.
pub fn plan_response(novedad: &Novedad) -> ResponsePlan {
    let guide = novedad.guide.clone();

    if novedad.attempts >= MAX_ATTEMPTS {
        return ResponsePlan::new(format!(
            "{} intentos sin resolver la guía {guide}; pasa a un operador",
            novedad.attempts
        ))
        .with_action(ResponseAction::Escalate {
            guide,
            reason: format!("Se agotaron {MAX_ATTEMPTS} intentos de contacto"),
        });
    }

    match novedad.kind {
        NovedadKind::DireccionErrada => ResponsePlan::new("Dirección incorrecta; confirmar con el cliente y reprogramar")
            .with_action(ResponseAction::ContactCustomer {
                guide: guide.clone(),
                channel: ContactChannel::Whatsapp,
                message: format!(
                    "Hola, tu pedido con guía {guide} no pudo entregarse por la dirección. ¿Nos confirmas la dirección completa?"
                ),
            })
            .with_action(ResponseAction::VerifyAddress { guide: guide.clone() })
            .with_action(ResponseAction::Reschedule { guide }),

        NovedadKind::ClienteAusente => ResponsePlan::new("Cliente ausente; acordar nueva visita")
            .with_action(ResponseAction::ContactCustomer {
                guide: guide.clone(),
                channel: ContactChannel::Call,
                message: format!(
                    "Intentamos entregar tu pedido {guide} y no te encontramos. ¿Qué día te queda mejor?"
                ),
            })
            .with_action(ResponseAction::Reschedule { guide }),

        NovedadKind::Rechazado => ResponsePlan::new("Pedido rechazado; confirmar motivo antes de devolver")
            .with_action(ResponseAction::ContactCustomer {
                guide: guide.clone(),
                channel: ContactChannel::Call,
                message: format!("Nos reportan que rechazaste el pedido {guide}. ¿Nos cuentas qué pasó?"),
            })
            .with_action(ResponseAction::Escalate {
                guide,
                reason: "Rechazo del cliente".to_string(),
            }),

        NovedadKind::ZonaDificilAcceso => ResponsePlan::new("Zona de difícil acceso; coordinar retiro en oficina")
            .with_action(ResponseAction::RequestCarrierReview {
                guide: guide.clone(),
                carrier: novedad.carrier,
            })
            .with_action(ResponseAction::ContactCustomer {
                guide: guide.clone(),
                channel: ContactChannel::Sms,
                message: format!(
                    "Tu pedido {guide} no puede llegar a tu zona. Puedes retirarlo en la oficina más cercana."
                ),
            }),

        NovedadKind::Devolucion => ResponsePlan::new("Envío en devolución; aceptar retorno")
            .with_action(ResponseAction::ReturnToSender { guide }),

        NovedadKind::Otro => ResponsePlan::new("Novedad sin categoría; revisar con la transportadora")
            .with_action(ResponseAction::RequestCarrierReview {
                guide: guide.clone(),
                carrier: novedad.carrier,
            })
            .with_action(ResponseAction::ContactCustomer {
                guide: guide.clone(),
                channel: ContactChannel::Whatsapp,
                message: format!("Estamos revisando una novedad con tu pedido {guide}. Te contactaremos pronto."),
            }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NovedadStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub escalated: usize,
    /// Resolved over total, in [0, 1].
    pub resolution_rate: f64,
    pub by_kind: HashMap<NovedadKind, usize>,
}

/// Tracks delivery exceptions raised from `ISSUE` shipments.
pub struct NovedadesService {
    store: Arc<dyn KeyValueStore>,
    novedades: DashMap<Uuid, Novedad>,
    /// Held across the whole check-then-insert in `detect`.
    detect_lock: Mutex<()>,
}

impl NovedadesService {
    /// Load persisted novedades, starting empty when there are none.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let saved: Vec<Novedad> = load_json_or_default(store.as_ref(), NOVEDADES_KEY).await?;
        tracing::debug!(count = saved.len(), "loaded novedades");
        Ok(Self {
            store,
            novedades: saved.into_iter().map(|n| (n.id, n)).collect(),
            detect_lock: Mutex::new(()),
        })
    }

    /// Open one novedad per `ISSUE` shipment whose guía has no unresolved
    /// one. Escalated novedades keep blocking until someone resolves them.
    /// Returns the newly created novedades.
    pub async fn detect(&self, shipments: &[Shipment]) -> Result<Vec<Novedad>> {
        let _guard = self.detect_lock.lock().await;
        let mut created = Vec::new();
        for shipment in shipments
            .iter()
            .filter(|s| s.status == ShipmentStatus::Issue)
        {
            let pending = self
                .novedades
                .iter()
                .any(|n| n.guide == shipment.id && n.is_unresolved());
            if pending {
                continue;
            }

            let description = shipment
                .detailed_info
                .as_ref()
                .and_then(|d| {
                    d.raw_status
                        .clone()
                        .or_else(|| d.latest_event().map(|e| e.description.clone()))
                })
                .unwrap_or_else(|| "Novedad reportada".to_string());
            let novedad = Novedad::new(
                shipment.id.clone(),
                shipment.carrier,
                classify_kind(&description),
                description,
            );
            tracing::info!(guide = %novedad.guide, kind = ?novedad.kind, "novedad detected");
            self.novedades.insert(novedad.id, novedad.clone());
            created.push(novedad);
        }

        if !created.is_empty() {
            self.persist().await?;
        }
        Ok(created)
    }

    pub fn get(&self, id: Uuid) -> Result<Novedad> {
        self.novedades
            .get(&id)
            .map(|n| n.value().clone())
            .ok_or(LitperError::NovedadNotFound(id))
    }

    /// All novedades, oldest first.
    pub fn list(&self) -> Vec<Novedad> {
        let mut list: Vec<Novedad> = self.novedades.iter().map(|n| n.value().clone()).collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.guide.cmp(&b.guide)));
        list
    }

    pub fn open_count(&self) -> usize {
        self.novedades.iter().filter(|n| n.is_open()).count()
    }

    pub fn plan(&self, id: Uuid) -> Result<ResponsePlan> {
        Ok(plan_response(&self.get(id)?))
    }

    /// Record a contact attempt. Past [`MAX_ATTEMPTS`] the novedad escalates.
    pub async fn start(&self, id: Uuid) -> Result<Novedad> {
        let updated = self.update(id, |n| {
            if !n.is_open() {
                return Err(LitperError::InvalidInput(format!(
                    "Novedad {id} is already {:?}",
                    n.status
                )));
            }
            n.attempts += 1;
            n.status = if n.attempts > MAX_ATTEMPTS {
                NovedadStatus::Escalated
            } else {
                NovedadStatus::InProgress
            };
            Ok(())
        })?;
        self.persist().await?;
        Ok(updated)
    }

    pub async fn resolve(&self, id: Uuid, resolution: impl Into<String>) -> Result<Novedad> {
        let resolution = resolution.into();
        let updated = self.update(id, |n| {
            if n.status == NovedadStatus::Resolved {
                return Err(LitperError::InvalidInput(format!(
                    "Novedad {id} is already resolved"
                )));
            }
            n.status = NovedadStatus::Resolved;
            n.resolution = Some(resolution);
            n.resolved_at = Some(Utc::now());
            Ok(())
        })?;
        tracing::info!(guide = %updated.guide, "novedad resolved");
        self.persist().await?;
        Ok(updated)
    }

    pub async fn escalate(&self, id: Uuid, reason: impl Into<String>) -> Result<Novedad> {
        let reason = reason.into();
        let updated = self.update(id, |n| {
            if n.status == NovedadStatus::Resolved {
                return Err(LitperError::InvalidInput(format!(
                    "Novedad {id} is already resolved"
                )));
            }
            n.status = NovedadStatus::Escalated;
            n.resolution = Some(reason);
            Ok(())
        })?;
        tracing::warn!(guide = %updated.guide, "novedad escalated");
        self.persist().await?;
        Ok(updated)
    }

    pub fn stats(&self) -> NovedadStats {
        let mut stats = NovedadStats::default();
        for n in self.novedades.iter() {
            stats.total += 1;
            match n.status {
                NovedadStatus::Open => stats.open += 1,
                NovedadStatus::InProgress => stats.in_progress += 1,
                NovedadStatus::Resolved => stats.resolved += 1,
                NovedadStatus::Escalated => stats.escalated += 1,
            }
            *stats.by_kind.entry(n.kind).or_insert(0) += 1;
        }
        if stats.total > 0 {
            stats.resolution_rate = stats.resolved as f64 / stats.total as f64;
        }
        stats
    }

    fn update(&self, id: Uuid, apply: impl FnOnce(&mut Novedad) -> Result<()>) -> Result<Novedad> {
        let mut entry = self
            .novedades
            .get_mut(&id)
            .ok_or(LitperError::NovedadNotFound(id))?;
        apply(entry.value_mut())?;
        entry.updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    async fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), NOVEDADES_KEY, &self.list()).await
    }
}
