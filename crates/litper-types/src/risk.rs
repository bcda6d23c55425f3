use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LitperError;

/// Risk tiers shown on dashboards, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Normal,
    #[serde(alias = "INFO")]
    Watch,
    Attention,
    #[serde(alias = "CRITICAL")]
    Urgent,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Normal,
        RiskLevel::Watch,
        RiskLevel::Attention,
        RiskLevel::Urgent,
    ];

    /// The dashboards call the urgent tier "critical".
    pub fn is_critical(self) -> bool {
        self == RiskLevel::Urgent
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Normal => "NORMAL",
            RiskLevel::Watch => "WATCH",
            RiskLevel::Attention => "ATTENTION",
            RiskLevel::Urgent => "URGENT",
        };
        f.write_str(label)
    }
}

impl FromStr for RiskLevel {
    type Err = LitperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(RiskLevel::Normal),
            "WATCH" | "INFO" => Ok(RiskLevel::Watch),
            "ATTENTION" => Ok(RiskLevel::Attention),
            "URGENT" | "CRITICAL" => Ok(RiskLevel::Urgent),
            other => Err(LitperError::InvalidInput(format!("Unknown risk level: {other}"))),
        }
    }
}

/// Derived risk assessment for a shipment. Recomputed on demand, never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRisk {
    pub level: RiskLevel,
    /// Why the shipment landed in this tier.
    pub reason: String,
    /// What the operator should do next.
    pub action: String,
}

impl ShipmentRisk {
    pub fn new(level: RiskLevel, reason: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            level,
            reason: reason.into(),
            action: action.into(),
        }
    }
}
