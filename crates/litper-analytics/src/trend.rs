use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use litper_types::{Shipment, ShipmentStatus};

use crate::risk::is_critical;
use crate::summary::percentage;

pub const MAX_TREND_DAYS: u32 = 365;

/// Daily totals for the trend chart, keyed by the day a shipment was
/// first recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: usize,
    pub delivered: usize,
    pub issues: usize,
    pub critical: usize,
    pub delivery_rate: u8,
}

impl TrendPoint {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total: 0,
            delivered: 0,
            issues: 0,
            critical: 0,
            delivery_rate: 0,
        }
    }
}

/// One point per calendar day ending at `today`, oldest first. Days with
/// no shipments are present with zero counts. `days` is clamped to
/// `1..=MAX_TREND_DAYS`.
pub fn trends(shipments: &[Shipment], days: u32, today: NaiveDate) -> Vec<TrendPoint> {
    let days = days.clamp(1, MAX_TREND_DAYS);
    let start = today
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(NaiveDate::MIN);

    let mut points: BTreeMap<NaiveDate, TrendPoint> = start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|d| (d, TrendPoint::empty(d)))
        .collect();

    for shipment in shipments {
        let Some(point) = points.get_mut(&shipment.created_at.date_naive()) else {
            continue;
        };
        point.total += 1;
        match shipment.status {
            ShipmentStatus::Delivered => point.delivered += 1,
            ShipmentStatus::Issue => point.issues += 1,
            _ => {}
        }
        if is_critical(shipment) {
            point.critical += 1;
        }
    }

    points
        .into_values()
        .map(|mut p| {
            p.delivery_rate = percentage(p.delivered, p.total);
            p
        })
        .collect()
}
