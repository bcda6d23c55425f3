use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use litper_parsing::fold_accents;
use litper_types::{Carrier, RiskLevel, Shipment, ShipmentStatus};

use crate::risk::risk_level;

/// Bucket for shipments without a destination city.
pub const NO_CITY: &str = "SIN CIUDAD";

/// Canonical spelling of a city name: trimmed, upper-case, no accents.
/// "Bogotá", "BOGOTÁ" and " bogota " all land on "BOGOTA".
pub fn normalize_city(city: &str) -> String {
    fold_accents(city.trim())
}

/// Bucket key for the city breakdown.
pub fn city_key(shipment: &Shipment) -> String {
    shipment
        .city()
        .map(normalize_city)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| NO_CITY.to_string())
}

/// Table filter. Every field is optional; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentFilter {
    pub carrier: Option<Carrier>,
    pub city: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub risk: Option<RiskLevel>,
    /// Free-text search over guía, phone, city and carrier name.
    #[serde(alias = "q")]
    pub query: Option<String>,
}

impl ShipmentFilter {
    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = Some(carrier);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_status(mut self, status: ShipmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, shipment: &Shipment) -> bool {
        if self.carrier.is_some_and(|c| c != shipment.carrier) {
            return false;
        }
        if self.status.is_some_and(|s| s != shipment.status) {
            return false;
        }
        if let Some(city) = self.city.as_deref().map(normalize_city).filter(|c| !c.is_empty()) {
            if city_key(shipment) != city {
                return false;
            }
        }
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let needle = fold_accents(query);
            let haystack = [
                Some(shipment.id.as_str()),
                shipment.phone.as_deref(),
                shipment.city(),
                Some(shipment.carrier.display_name()),
            ];
            if !haystack
                .iter()
                .flatten()
                .any(|h| fold_accents(h).contains(&needle))
            {
                return false;
            }
        }
        // Risk last: it's the only check that runs the classifier.
        if self.risk.is_some_and(|r| r != risk_level(shipment)) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, shipments: &'a [Shipment]) -> Vec<&'a Shipment> {
        shipments.iter().filter(|s| self.matches(s)).collect()
    }
}

/// Shipment counts per carrier. Sums to `shipments.len()`.
pub fn partition_by_carrier(shipments: &[Shipment]) -> BTreeMap<Carrier, usize> {
    let mut buckets = BTreeMap::new();
    for shipment in shipments {
        *buckets.entry(shipment.carrier).or_insert(0) += 1;
    }
    buckets
}

/// Shipment counts per destination city, with [`NO_CITY`] for the rest.
pub fn partition_by_city(shipments: &[Shipment]) -> BTreeMap<String, usize> {
    let mut buckets = BTreeMap::new();
    for shipment in shipments {
        *buckets.entry(city_key(shipment)).or_insert(0) += 1;
    }
    buckets
}
