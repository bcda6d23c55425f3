use serde::{Deserialize, Serialize};

use litper_types::{Carrier, RiskLevel, Shipment, ShipmentRisk, ShipmentStatus};

use crate::risk::classify;

/// A shipment that needs an operator's attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub guide: String,
    pub carrier: Carrier,
    pub status: ShipmentStatus,
    pub days_in_transit: u32,
    pub phone: Option<String>,
    pub risk: ShipmentRisk,
}

impl Alert {
    pub fn level(&self) -> RiskLevel {
        self.risk.level
    }
}

/// Every non-normal shipment, most severe first, then oldest first, then
/// by guía so the order is stable.
pub fn critical_alerts(shipments: &[Shipment]) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = shipments
        .iter()
        .filter_map(|s| {
            let risk = classify(s);
            (risk.level != RiskLevel::Normal).then(|| Alert {
                guide: s.id.clone(),
                carrier: s.carrier,
                status: s.status,
                days_in_transit: s.days_in_transit().unwrap_or(0),
                phone: s.phone.clone(),
                risk,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.level()
            .cmp(&a.level())
            .then(b.days_in_transit.cmp(&a.days_in_transit))
            .then_with(|| a.guide.cmp(&b.guide))
    });
    alerts
}
