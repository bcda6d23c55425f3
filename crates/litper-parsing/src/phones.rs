use serde::{Deserialize, Serialize};

use litper_types::{Country, Shipment};

use crate::normalize::{is_guide, normalize_phone};

/// One line of a pasted phone list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneEntry {
    /// Guía the phone belongs to, when the line names one.
    pub guide: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneList {
    pub entries: Vec<PhoneEntry>,
    pub warnings: Vec<String>,
}

/// Parse a phone list. Lines hold either a bare phone ("300 123 4567")
/// or a guía followed by its phone ("240012345678 3001234567").
pub fn parse_phone_list(text: &str, country: Country) -> PhoneList {
    let mut list = PhoneList::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(phone) = normalize_phone(line, country) {
            list.entries.push(PhoneEntry { guide: None, phone });
            continue;
        }

        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
            .filter(|t| !t.is_empty())
            .collect();

        let phone_idx = tokens
            .iter()
            .rposition(|t| normalize_phone(t, country).is_some());
        let guide = tokens
            .iter()
            .enumerate()
            .find(|(i, t)| Some(*i) != phone_idx && is_guide(t))
            .map(|(i, t)| (i, t.to_ascii_uppercase()));

        let phone = match phone_idx {
            Some(i) => normalize_phone(tokens[i], country),
            // A phone written with spaces is split across several tokens.
            None => guide.as_ref().and_then(|(gi, _)| {
                let rest = tokens
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i != gi)
                    .map(|(_, t)| *t)
                    .collect::<Vec<_>>()
                    .join(" ");
                normalize_phone(&rest, country)
            }),
        };

        match phone {
            Some(phone) => list.entries.push(PhoneEntry {
                guide: guide.map(|(_, g)| g),
                phone,
            }),
            None => list
                .warnings
                .push(format!("línea {}: sin teléfono válido", idx + 1)),
        }
    }

    list
}

/// Attach phones to shipments. Entries naming a guía go to that shipment;
/// bare phones fill shipments that still lack one, in list order.
/// Returns how many shipments received a phone.
pub fn apply_phone_list(shipments: &mut [Shipment], entries: &[PhoneEntry]) -> usize {
    let mut assigned = 0;

    for entry in entries.iter().filter(|e| e.guide.is_some()) {
        if let Some(shipment) = shipments
            .iter_mut()
            .find(|s| Some(s.id.as_str()) == entry.guide.as_deref())
        {
            shipment.phone = Some(entry.phone.clone());
            assigned += 1;
        }
    }

    let mut bare = entries.iter().filter(|e| e.guide.is_none());
    for shipment in shipments.iter_mut().filter(|s| s.phone.is_none()) {
        let Some(entry) = bare.next() else {
            break;
        };
        shipment.phone = Some(entry.phone.clone());
        assigned += 1;
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use litper_types::{Carrier, ShipmentStatus};

    #[test]
    fn test_parse_mixed_list() {
        let text = "300 123 4567\n240012345678 3109876543\n240012345679\t+57 311 555 0000\nsin dato\n";
        let list = parse_phone_list(text, Country::Colombia);
        assert_eq!(list.entries.len(), 3);
        assert_eq!(list.entries[0].guide, None);
        assert_eq!(list.entries[0].phone, "3001234567");
        assert_eq!(list.entries[1].guide.as_deref(), Some("240012345678"));
        assert_eq!(list.entries[1].phone, "3109876543");
        assert_eq!(list.entries[2].guide.as_deref(), Some("240012345679"));
        assert_eq!(list.entries[2].phone, "3115550000");
        assert_eq!(list.warnings.len(), 1);
    }

    #[test]
    fn test_apply_by_guide_then_position() {
        let mut shipments = vec![
            Shipment::new("A1000001", Carrier::Envia, ShipmentStatus::InTransit),
            Shipment::new("A1000002", Carrier::Envia, ShipmentStatus::InTransit),
            Shipment::new("A1000003", Carrier::Envia, ShipmentStatus::InTransit),
        ];
        let entries = vec![
            PhoneEntry {
                guide: Some("A1000002".into()),
                phone: "3000000002".into(),
            },
            PhoneEntry {
                guide: None,
                phone: "3000000001".into(),
            },
            PhoneEntry {
                guide: None,
                phone: "3000000003".into(),
            },
        ];
        let assigned = apply_phone_list(&mut shipments, &entries);
        assert_eq!(assigned, 3);
        assert_eq!(shipments[0].phone.as_deref(), Some("3000000001"));
        assert_eq!(shipments[1].phone.as_deref(), Some("3000000002"));
        assert_eq!(shipments[2].phone.as_deref(), Some("3000000003"));
    }

    #[test]
    fn test_apply_with_more_shipments_than_phones() {
        let mut shipments = vec![
            Shipment::new("B1000001", Carrier::Tcc, ShipmentStatus::Pending),
            Shipment::new("B1000002", Carrier::Tcc, ShipmentStatus::Pending),
        ];
        let entries = vec![PhoneEntry {
            guide: None,
            phone: "3001112222".into(),
        }];
        assert_eq!(apply_phone_list(&mut shipments, &entries), 1);
        assert!(shipments[1].phone.is_none());
    }
}
