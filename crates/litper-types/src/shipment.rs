use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::carrier::{Carrier, Country};
use crate::risk::ShipmentRisk;

/// Normalized delivery status shared by every carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    InTransit,
    InOffice,
    Delivered,
    Issue,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 5] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InTransit,
        ShipmentStatus::InOffice,
        ShipmentStatus::Delivered,
        ShipmentStatus::Issue,
    ];

    pub fn is_delivered(self) -> bool {
        self == ShipmentStatus::Delivered
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::InOffice => "IN_OFFICE",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Issue => "ISSUE",
        };
        f.write_str(label)
    }
}

/// A single tracking checkpoint as reported by the carrier (carrier local time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentEvent {
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub description: String,
}

impl ShipmentEvent {
    pub fn new(
        timestamp: NaiveDateTime,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            location: location.into(),
            description: description.into(),
        }
    }

    fn same_checkpoint(&self, other: &ShipmentEvent) -> bool {
        self.timestamp == other.timestamp && self.description == other.description
    }
}

/// Extended tracking data available for some carriers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedShipmentInfo {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub days_in_transit: Option<u32>,
    /// Most recent first.
    #[serde(default)]
    pub events: Vec<ShipmentEvent>,
    pub estimated_delivery: Option<NaiveDate>,
    /// Status text exactly as the carrier printed it.
    pub raw_status: Option<String>,
}

impl DetailedShipmentInfo {
    pub fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.days_in_transit.is_none()
            && self.events.is_empty()
            && self.estimated_delivery.is_none()
            && self.raw_status.is_none()
    }

    /// Add an event unless the same checkpoint is already recorded, keeping
    /// the list most-recent-first.
    pub fn push_event(&mut self, event: ShipmentEvent) {
        if self.events.iter().any(|e| e.same_checkpoint(&event)) {
            return;
        }
        self.events.push(event);
        self.events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }

    pub fn latest_event(&self) -> Option<&ShipmentEvent> {
        self.events.first()
    }

    fn merge_from(&mut self, other: DetailedShipmentInfo) {
        if other.origin.is_some() {
            self.origin = other.origin;
        }
        if other.destination.is_some() {
            self.destination = other.destination;
        }
        if other.days_in_transit.is_some() {
            self.days_in_transit = other.days_in_transit;
        }
        if other.estimated_delivery.is_some() {
            self.estimated_delivery = other.estimated_delivery;
        }
        if other.raw_status.is_some() {
            self.raw_status = other.raw_status;
        }
        for event in other.events {
            self.push_event(event);
        }
    }
}

/// Summary produced by an assistant-driven tracking refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiTrackingSummary {
    pub summary: String,
    pub next_step: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

/// A parcel identified by its guía.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Tracking number (guía).
    pub id: String,
    pub carrier: Carrier,
    pub status: ShipmentStatus,
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Country,
    pub detailed_info: Option<DetailedShipmentInfo>,
    pub ai_tracking: Option<AiTrackingSummary>,
    pub risk: Option<ShipmentRisk>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(id: impl Into<String>, carrier: Carrier, status: ShipmentStatus) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            carrier,
            status,
            phone: None,
            country: Country::default(),
            detailed_info: None,
            ai_tracking: None,
            risk: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_country(mut self, country: Country) -> Self {
        self.country = country;
        self
    }

    pub fn with_days_in_transit(mut self, days: u32) -> Self {
        self.detail_mut().days_in_transit = Some(days);
        self
    }

    pub fn with_destination(mut self, city: impl Into<String>) -> Self {
        self.detail_mut().destination = Some(city.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Mutable access to the detailed info, creating it when absent.
    pub fn detail_mut(&mut self) -> &mut DetailedShipmentInfo {
        self.detailed_info.get_or_insert_with(DetailedShipmentInfo::default)
    }

    pub fn days_in_transit(&self) -> Option<u32> {
        self.detailed_info.as_ref().and_then(|d| d.days_in_transit)
    }

    /// Destination city, used for the city filter.
    pub fn city(&self) -> Option<&str> {
        self.detailed_info
            .as_ref()
            .and_then(|d| d.destination.as_deref())
    }

    /// Fold a newer report of the same guía into this record.
    ///
    /// The incoming status wins, missing fields are filled in, events are
    /// unioned. The cached risk is dropped because the inputs changed.
    pub fn merge_from(&mut self, other: Shipment) {
        debug_assert_eq!(self.id, other.id);
        self.status = other.status;
        if !self.carrier.is_known() {
            self.carrier = other.carrier;
        }
        if other.phone.is_some() {
            self.phone = other.phone;
        }
        if let Some(info) = other.detailed_info {
            match self.detailed_info.as_mut() {
                Some(existing) => existing.merge_from(info),
                None => self.detailed_info = Some(info),
            }
        }
        if other.ai_tracking.is_some() {
            self.ai_tracking = other.ai_tracking;
        }
        self.risk = None;
        self.updated_at = Utc::now().max(other.updated_at);
    }
}
