use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use litper_types::Shipment;

/// How an import changed the book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub created: usize,
    pub updated: usize,
}

impl MergeReport {
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// The shipment collection keyed by guía. Re-importing a guía updates the
/// existing record instead of duplicating it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentBook {
    shipments: BTreeMap<String, Shipment>,
}

impl ShipmentBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(shipments: Vec<Shipment>) -> Self {
        let mut book = Self::new();
        book.merge(shipments);
        book
    }

    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Shipment>) -> MergeReport {
        let mut report = MergeReport::default();
        for shipment in incoming {
            match self.shipments.get_mut(&shipment.id) {
                Some(existing) => {
                    existing.merge_from(shipment);
                    report.updated += 1;
                }
                None => {
                    self.shipments.insert(shipment.id.clone(), shipment);
                    report.created += 1;
                }
            }
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&Shipment> {
        self.shipments.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Shipment> {
        self.shipments.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Shipment> {
        self.shipments.remove(id)
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shipment> {
        self.shipments.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Shipment> {
        self.shipments.values_mut()
    }

    pub fn to_vec(&self) -> Vec<Shipment> {
        self.shipments.values().cloned().collect()
    }
}

/// Fold a parsed batch into `book`.
pub fn merge_into(book: &mut ShipmentBook, incoming: Vec<Shipment>) -> MergeReport {
    let report = book.merge(incoming);
    tracing::debug!(
        created = report.created,
        updated = report.updated,
        total = book.len(),
        "merged shipments into book"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use litper_types::{Carrier, ShipmentStatus};

    #[test]
    fn test_merge_counts_created_and_updated() {
        let mut book = ShipmentBook::from_vec(vec![
            Shipment::new("100000001", Carrier::Tcc, ShipmentStatus::InTransit),
            Shipment::new("100000002", Carrier::Tcc, ShipmentStatus::InTransit),
        ]);
        assert_eq!(book.len(), 2);

        let report = book.merge(vec![
            Shipment::new("100000002", Carrier::Tcc, ShipmentStatus::Delivered),
            Shipment::new("100000003", Carrier::Envia, ShipmentStatus::Pending),
        ]);
        assert_eq!(report, MergeReport { created: 1, updated: 1 });
        assert_eq!(report.total(), 2);
        assert_eq!(book.len(), 3);
        assert_eq!(
            book.get("100000002").map(|s| s.status),
            Some(ShipmentStatus::Delivered)
        );
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let book = ShipmentBook::from_vec(vec![Shipment::new(
            "100000009",
            Carrier::Deprisa,
            ShipmentStatus::Pending,
        )]);
        let json = serde_json::to_value(&book).unwrap();
        assert!(json.get("100000009").is_some());
        let back: ShipmentBook = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
