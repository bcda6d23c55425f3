use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::carrier::Carrier;

/// Category of a delivery exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NovedadKind {
    DireccionErrada,
    ClienteAusente,
    Rechazado,
    ZonaDificilAcceso,
    Devolucion,
    Otro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NovedadStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Escalated,
}

/// A delivery exception that needs an operator or agent to intervene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Novedad {
    pub id: Uuid,
    /// Guía of the affected shipment.
    pub guide: String,
    pub carrier: Carrier,
    pub kind: NovedadKind,
    pub description: String,
    pub status: NovedadStatus,
    /// Contact attempts made so far.
    pub attempts: u32,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Novedad {
    pub fn new(
        guide: impl Into<String>,
        carrier: Carrier,
        kind: NovedadKind,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            guide: guide.into(),
            carrier,
            kind,
            description: description.into(),
            status: NovedadStatus::Open,
            attempts: 0,
            resolution: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Still waiting on someone to act.
    pub fn is_open(&self) -> bool {
        matches!(self.status, NovedadStatus::Open | NovedadStatus::InProgress)
    }

    /// Open, in progress or escalated. A guía has at most one of these.
    pub fn is_unresolved(&self) -> bool {
        self.status != NovedadStatus::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_novedad_is_open() {
        let novedad = Novedad::new(
            "240012345678",
            Carrier::Interrapidisimo,
            NovedadKind::ClienteAusente,
            "Cliente no se encontraba",
        );
        assert!(novedad.is_open());
        assert_eq!(novedad.attempts, 0);
    }

    #[test]
    fn test_novedad_json_rehydrates_dates() {
        let mut novedad = Novedad::new("ENV1", Carrier::Envia, NovedadKind::Rechazado, "Rehusado");
        novedad.status = NovedadStatus::Resolved;
        novedad.resolved_at = Some(Utc::now());
        let json = serde_json::to_string(&novedad).unwrap();
        let back: Novedad = serde_json::from_str(&json).unwrap();
        assert_eq!(back, novedad);
        assert!(!back.is_open());
    }
}
