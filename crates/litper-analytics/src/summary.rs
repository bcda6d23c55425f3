use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use litper_types::{Carrier, RiskLevel, Shipment, ShipmentStatus};

use crate::filter::city_key;
use crate::risk::risk_level;

/// Default on-time threshold for OTIF, in days.
pub const DEFAULT_SLA_DAYS: u32 = 3;

/// Rounded percentage `part / total`, 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (part as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// `round(delivered / total * 100)`, 0 for an empty list.
pub fn delivery_rate(shipments: &[Shipment]) -> u8 {
    let delivered = shipments.iter().filter(|s| s.status.is_delivered()).count();
    percentage(delivered, shipments.len())
}

/// Share of shipments delivered within `sla_days`.
pub fn otif_rate(shipments: &[Shipment], sla_days: u32) -> u8 {
    let on_time = shipments
        .iter()
        .filter(|s| s.status.is_delivered() && s.days_in_transit().unwrap_or(0) <= sla_days)
        .count();
    percentage(on_time, shipments.len())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_transit: usize,
    pub in_office: usize,
    pub delivered: usize,
    pub issue: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: ShipmentStatus) {
        match status {
            ShipmentStatus::Pending => self.pending += 1,
            ShipmentStatus::InTransit => self.in_transit += 1,
            ShipmentStatus::InOffice => self.in_office += 1,
            ShipmentStatus::Delivered => self.delivered += 1,
            ShipmentStatus::Issue => self.issue += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_transit + self.in_office + self.delivered + self.issue
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBuckets {
    pub normal: usize,
    pub watch: usize,
    pub attention: usize,
    pub urgent: usize,
}

impl RiskBuckets {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Normal => self.normal += 1,
            RiskLevel::Watch => self.watch += 1,
            RiskLevel::Attention => self.attention += 1,
            RiskLevel::Urgent => self.urgent += 1,
        }
    }

    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Normal => self.normal,
            RiskLevel::Watch => self.watch,
            RiskLevel::Attention => self.attention,
            RiskLevel::Urgent => self.urgent,
        }
    }
}

/// Counters shared by the per-carrier and per-city breakdowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub total: usize,
    pub delivered: usize,
    pub issues: usize,
    pub critical: usize,
    pub delivery_rate: u8,
}

impl GroupStats {
    fn record(&mut self, shipment: &Shipment, level: RiskLevel) {
        self.total += 1;
        match shipment.status {
            ShipmentStatus::Delivered => self.delivered += 1,
            ShipmentStatus::Issue => self.issues += 1,
            _ => {}
        }
        if level.is_critical() {
            self.critical += 1;
        }
        self.delivery_rate = percentage(self.delivered, self.total);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierStats {
    pub carrier: Carrier,
    #[serde(flatten)]
    pub stats: GroupStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    pub city: String,
    #[serde(flatten)]
    pub stats: GroupStats,
}

/// Everything the main dashboard shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub by_status: StatusCounts,
    pub delivery_rate: u8,
    pub otif_rate: u8,
    pub sla_days: u32,
    pub critical_count: usize,
    pub issue_count: usize,
    pub risk: RiskBuckets,
    pub avg_days_in_transit: f64,
    pub carriers: Vec<CarrierStats>,
    pub cities: Vec<CityStats>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSummary {
    pub fn compute(shipments: &[Shipment], sla_days: u32) -> Self {
        let mut by_status = StatusCounts::default();
        let mut risk = RiskBuckets::default();
        let mut carriers: BTreeMap<Carrier, GroupStats> = BTreeMap::new();
        let mut cities: BTreeMap<String, GroupStats> = BTreeMap::new();
        let mut days_sum = 0u64;
        let mut days_seen = 0u64;

        for shipment in shipments {
            let level = risk_level(shipment);
            by_status.record(shipment.status);
            risk.record(level);
            carriers
                .entry(shipment.carrier)
                .or_default()
                .record(shipment, level);
            cities
                .entry(city_key(shipment))
                .or_default()
                .record(shipment, level);
            if let Some(days) = shipment.days_in_transit() {
                days_sum += u64::from(days);
                days_seen += 1;
            }
        }

        let avg_days_in_transit = if days_seen == 0 {
            0.0
        } else {
            (days_sum as f64 / days_seen as f64 * 10.0).round() / 10.0
        };

        let mut carriers: Vec<CarrierStats> = carriers
            .into_iter()
            .map(|(carrier, stats)| CarrierStats { carrier, stats })
            .collect();
        carriers.sort_by(|a, b| b.stats.total.cmp(&a.stats.total).then(a.carrier.cmp(&b.carrier)));

        let mut cities: Vec<CityStats> = cities
            .into_iter()
            .map(|(city, stats)| CityStats { city, stats })
            .collect();
        cities.sort_by(|a, b| b.stats.total.cmp(&a.stats.total).then(a.city.cmp(&b.city)));

        Self {
            total: shipments.len(),
            delivery_rate: percentage(by_status.delivered, shipments.len()),
            otif_rate: otif_rate(shipments, sla_days),
            sla_days,
            critical_count: risk.urgent,
            issue_count: by_status.issue,
            by_status,
            risk,
            avg_days_in_transit,
            carriers,
            cities,
            generated_at: Utc::now(),
        }
    }
}

/// Summary with the default SLA.
pub fn summarize(shipments: &[Shipment]) -> DashboardSummary {
    DashboardSummary::compute(shipments, DEFAULT_SLA_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_rate_rounds() {
        let list = vec![
            Shipment::new("1000001", Carrier::Tcc, ShipmentStatus::Delivered),
            Shipment::new("1000002", Carrier::Tcc, ShipmentStatus::InTransit),
            Shipment::new("1000003", Carrier::Tcc, ShipmentStatus::InTransit),
        ];
        assert_eq!(delivery_rate(&list), 33);
        assert_eq!(delivery_rate(&[]), 0);
    }

    #[test]
    fn test_otif_counts_only_on_time_deliveries() {
        let list = vec![
            Shipment::new("1000001", Carrier::Tcc, ShipmentStatus::Delivered).with_days_in_transit(2),
            Shipment::new("1000002", Carrier::Tcc, ShipmentStatus::Delivered).with_days_in_transit(6),
            Shipment::new("1000003", Carrier::Tcc, ShipmentStatus::InTransit).with_days_in_transit(1),
            Shipment::new("1000004", Carrier::Tcc, ShipmentStatus::Issue),
        ];
        assert_eq!(otif_rate(&list, 3), 25);
        assert_eq!(otif_rate(&list, 6), 50);
    }

    #[test]
    fn test_breakdowns_sorted_by_volume() {
        let list = vec![
            Shipment::new("1000001", Carrier::Envia, ShipmentStatus::Delivered).with_destination("Cali"),
            Shipment::new("1000002", Carrier::Tcc, ShipmentStatus::InTransit).with_destination("Bogotá"),
            Shipment::new("1000003", Carrier::Tcc, ShipmentStatus::Delivered).with_destination("Bogotá"),
        ];
        let summary = summarize(&list);
        assert_eq!(summary.carriers[0].carrier, Carrier::Tcc);
        assert_eq!(summary.carriers[0].stats.total, 2);
        assert_eq!(summary.carriers[0].stats.delivery_rate, 50);
        assert_eq!(summary.cities[0].city, "BOGOTA");
        assert_eq!(summary.by_status.total(), 3);
    }

    #[test]
    fn test_average_days_ignores_missing() {
        let list = vec![
            Shipment::new("1000001", Carrier::Tcc, ShipmentStatus::InTransit).with_days_in_transit(2),
            Shipment::new("1000002", Carrier::Tcc, ShipmentStatus::InTransit).with_days_in_transit(3),
            Shipment::new("1000003", Carrier::Tcc, ShipmentStatus::InTransit),
        ];
        assert!((summarize(&list).avg_days_in_transit - 2.5).abs() < f64::EPSILON);
    }
}
