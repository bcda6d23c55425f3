use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use litper_types::{Carrier, Country, Result, Shipment, ShipmentEvent, ShipmentStatus};

use crate::normalize::{
    detect_carrier, extract_days, fold_accents, is_guide, normalize_phone, normalize_status,
};

static EVENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})(?:[ T](\d{1,2}:\d{2})(?::\d{2})?)?\s*[-|:]?\s*(.*)$",
    )
    .expect("valid event regex")
});

const FIELD_DELIMITERS: &[char] = &['|', ';', '\t'];

/// Values applied when a report doesn't say otherwise.
#[derive(Debug, Clone)]
pub struct ParseDefaults {
    pub carrier: Carrier,
    pub country: Country,
    /// Reference date for deriving days in transit from event history.
    pub today: NaiveDate,
}

impl Default for ParseDefaults {
    fn default() -> Self {
        Self {
            carrier: Carrier::Unknown,
            country: Country::default(),
            today: Utc::now().date_naive(),
        }
    }
}

/// Result of parsing one pasted report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// One record per guía, in first-seen order.
    pub shipments: Vec<Shipment>,
    /// Lines that could not be interpreted.
    pub warnings: Vec<String>,
}

impl ParseOutcome {
    /// Add a record, folding it into an earlier one with the same guía.
    pub fn push(&mut self, shipment: Shipment) {
        match self.shipments.iter_mut().find(|s| s.id == shipment.id) {
            Some(existing) => existing.merge_from(shipment),
            None => self.shipments.push(shipment),
        }
    }
}

/// Grammar for carrier report text. The layouts carriers send change
/// often, so the grammar sits behind this seam.
pub trait ReportParser: Send + Sync {
    fn parse(&self, text: &str, defaults: &ParseDefaults) -> Result<ParseOutcome>;

    fn name(&self) -> &str;
}

/// Line-oriented parser for the layouts the operations team pastes:
///
/// - a line holding only a carrier name sets the carrier for what follows;
/// - `Clave: valor` lines (Guía, Estado, Teléfono, Transportadora, Origen,
///   Destino, Días, Entrega estimada) build up one shipment block;
/// - dated lines (`2024-05-01 10:30 BOGOTA - Admitido` or `01/05/2024 ...`)
///   append tracking events to the current block;
/// - any other line holding a guía is a one-line summary record, with
///   fields separated by `|`, `;`, tabs or plain spaces.
#[derive(Debug, Clone, Default)]
pub struct LineReportParser;

impl ReportParser for LineReportParser {
    fn parse(&self, text: &str, defaults: &ParseDefaults) -> Result<ParseOutcome> {
        let mut outcome = ParseOutcome::default();
        let mut header_carrier = defaults.carrier;
        let mut draft: Option<Draft> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if line.is_empty() {
                flush(&mut draft, &mut outcome, defaults, line_no);
                continue;
            }

            if let Some(carrier) = carrier_header(line) {
                flush(&mut draft, &mut outcome, defaults, line_no);
                header_carrier = carrier;
                continue;
            }

            if let Some(event) = parse_event_line(line) {
                match draft.as_mut() {
                    Some(d) => d.events.push(event),
                    None => outcome
                        .warnings
                        .push(format!("línea {line_no}: evento sin guía asociada")),
                }
                continue;
            }

            if let Some((key, value)) = split_key_value(line) {
                if key == BlockKey::Guide {
                    flush(&mut draft, &mut outcome, defaults, line_no);
                }
                let d = draft.get_or_insert_with(|| Draft::new(header_carrier));
                d.set(key, value, defaults.country);
                continue;
            }

            match parse_summary_line(line, header_carrier, defaults) {
                Some(shipment) => {
                    flush(&mut draft, &mut outcome, defaults, line_no);
                    outcome.push(shipment);
                }
                None => {
                    tracing::debug!(line_no, line, "unrecognized report line");
                    outcome
                        .warnings
                        .push(format!("línea {line_no}: no reconocida: {line}"));
                }
            }
        }
        flush(&mut draft, &mut outcome, defaults, text.lines().count() + 1);

        Ok(outcome)
    }

    fn name(&self) -> &str {
        "LineReportParser"
    }
}

/// Parse with the default grammar.
pub fn parse_report(text: &str, defaults: &ParseDefaults) -> ParseOutcome {
    LineReportParser
        .parse(text, defaults)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKey {
    Guide,
    Status,
    Phone,
    Carrier,
    Origin,
    Destination,
    Days,
    EstimatedDelivery,
}

#[derive(Debug, Default)]
struct Draft {
    guide: Option<String>,
    status_text: Option<String>,
    phone: Option<String>,
    carrier: Carrier,
    origin: Option<String>,
    destination: Option<String>,
    days: Option<u32>,
    estimated_delivery: Option<NaiveDate>,
    events: Vec<ShipmentEvent>,
}

impl Draft {
    fn new(carrier: Carrier) -> Self {
        Self {
            carrier,
            ..Default::default()
        }
    }

    fn set(&mut self, key: BlockKey, value: &str, country: Country) {
        let value = value.trim();
        match key {
            BlockKey::Guide => self.guide = Some(value.to_ascii_uppercase()),
            BlockKey::Status => self.status_text = Some(value.to_string()),
            BlockKey::Phone => self.phone = normalize_phone(value, country),
            BlockKey::Carrier => {
                let carrier = detect_carrier(value);
                if carrier.is_known() {
                    self.carrier = carrier;
                }
            }
            BlockKey::Origin => self.origin = Some(value.to_string()),
            BlockKey::Destination => self.destination = Some(value.to_string()),
            BlockKey::Days => {
                self.days = value
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|s| !s.is_empty())
                    .and_then(|s| s.parse().ok())
            }
            BlockKey::EstimatedDelivery => self.estimated_delivery = parse_date(value),
        }
    }

    fn into_shipment(self, defaults: &ParseDefaults) -> Option<Shipment> {
        let guide = self.guide?;
        let status = match (&self.status_text, self.events.iter().max_by_key(|e| e.timestamp)) {
            (Some(text), _) => normalize_status(text),
            (None, Some(latest)) => normalize_status(&latest.description),
            (None, None) => ShipmentStatus::Pending,
        };

        let mut shipment = Shipment::new(guide, self.carrier, status).with_country(defaults.country);
        shipment.phone = self.phone;

        let derived_days = derive_days_in_transit(&self.events, status, defaults.today);
        let detail = shipment.detail_mut();
        detail.origin = self.origin;
        detail.destination = self.destination;
        detail.days_in_transit = self.days.or(derived_days);
        detail.estimated_delivery = self.estimated_delivery;
        detail.raw_status = self.status_text;
        for event in self.events {
            detail.push_event(event);
        }
        if detail.is_empty() {
            shipment.detailed_info = None;
        }
        Some(shipment)
    }
}

fn flush(
    draft: &mut Option<Draft>,
    outcome: &mut ParseOutcome,
    defaults: &ParseDefaults,
    line_no: usize,
) {
    if let Some(d) = draft.take() {
        match d.into_shipment(defaults) {
            Some(shipment) => outcome.push(shipment),
            None => outcome
                .warnings
                .push(format!("línea {line_no}: bloque sin número de guía")),
        }
    }
}

/// Days between the first tracking event and delivery (or `today` when
/// still open).
pub fn derive_days_in_transit(
    events: &[ShipmentEvent],
    status: ShipmentStatus,
    today: NaiveDate,
) -> Option<u32> {
    let first = events.iter().map(|e| e.timestamp.date()).min()?;
    let end = if status.is_delivered() {
        events.iter().map(|e| e.timestamp.date()).max()?
    } else {
        today
    };
    u32::try_from((end - first).num_days()).ok()
}

fn carrier_header(line: &str) -> Option<Carrier> {
    if line.contains(':') || line.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if line.split_whitespace().count() > 3 {
        return None;
    }
    let carrier = detect_carrier(line);
    carrier.is_known().then_some(carrier)
}

fn split_key_value(line: &str) -> Option<(BlockKey, &str)> {
    if line.contains(FIELD_DELIMITERS) {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    if value.trim().is_empty() || key.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if key.split_whitespace().count() > 4 {
        return None;
    }
    block_key(key).map(|k| (k, value))
}

fn block_key(key: &str) -> Option<BlockKey> {
    let folded = fold_accents(key);
    let folded = folded.trim();
    let key = if folded.contains("GUIA") || folded == "TRACKING" {
        BlockKey::Guide
    } else if folded.contains("ESTADO") {
        BlockKey::Status
    } else if folded.contains("TELEFONO") || folded.contains("CELULAR") || folded == "TEL" {
        BlockKey::Phone
    } else if folded.contains("TRANSPORTADORA") || folded == "CARRIER" {
        BlockKey::Carrier
    } else if folded.contains("ORIGEN") {
        BlockKey::Origin
    } else if folded.contains("DESTINO") || folded.contains("CIUDAD") {
        BlockKey::Destination
    } else if folded.contains("DIAS") {
        BlockKey::Days
    } else if folded.contains("ESTIMAD") || folded.contains("PROMESA") {
        BlockKey::EstimatedDelivery
    } else {
        return None;
    };
    Some(key)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
}

fn parse_event_line(line: &str) -> Option<ShipmentEvent> {
    let caps = EVENT_RE.captures(line)?;
    let date = parse_date(caps.get(1)?.as_str())?;
    let time = caps
        .get(2)
        .and_then(|m| NaiveTime::parse_from_str(m.as_str(), "%H:%M").ok())
        .unwrap_or(NaiveTime::MIN);
    let rest = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();
    if rest.is_empty() {
        return None;
    }

    let (location, description) = match rest.split_once(" - ").or_else(|| rest.split_once('|')) {
        Some((loc, desc)) => (loc.trim(), desc.trim()),
        None => ("", rest),
    };
    Some(ShipmentEvent::new(
        NaiveDateTime::new(date, time),
        location,
        description,
    ))
}

fn parse_summary_line(line: &str, carrier: Carrier, defaults: &ParseDefaults) -> Option<Shipment> {
    if line.contains(FIELD_DELIMITERS) {
        parse_delimited_summary(line, carrier, defaults)
    } else {
        parse_spaced_summary(line, carrier, defaults)
    }
}

/// Index of the guía among `fields`. Mobile numbers also look like guías,
/// so a phone-shaped field is only taken when nothing else qualifies.
fn pick_guide(fields: &[&str], country: Country) -> Option<usize> {
    fields
        .iter()
        .position(|f| is_guide(f) && normalize_phone(f, country).is_none())
        .or_else(|| fields.iter().position(|f| is_guide(f)))
}

fn parse_delimited_summary(
    line: &str,
    carrier: Carrier,
    defaults: &ParseDefaults,
) -> Option<Shipment> {
    let fields: Vec<&str> = line
        .split(FIELD_DELIMITERS)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    let guide_idx = pick_guide(&fields, defaults.country)?;

    let mut draft = Draft::new(carrier);
    draft.guide = Some(fields[guide_idx].to_ascii_uppercase());

    for (i, field) in fields.iter().enumerate() {
        if i == guide_idx {
            continue;
        }
        if let Some((key, value)) = field.split_once(':').and_then(|(k, v)| {
            block_key(k).filter(|k| *k != BlockKey::Guide).map(|k| (k, v))
        }) {
            draft.set(key, value, defaults.country);
        } else if let Some(phone) = normalize_phone(field, defaults.country) {
            draft.phone = Some(phone);
        } else if let Some(days) = extract_days(field).filter(|_| is_days_field(field)) {
            draft.days = Some(days);
        } else if detect_carrier(field).is_known() && !field.chars().any(|c| c.is_ascii_digit()) {
            draft.carrier = detect_carrier(field);
        } else if draft.status_text.is_none() {
            draft.status_text = Some(field.to_string());
        } else if draft.destination.is_none() && field.chars().all(|c| !c.is_ascii_digit()) {
            draft.destination = Some(field.to_string());
        }
    }
    draft.into_shipment(defaults)
}

fn parse_spaced_summary(line: &str, carrier: Carrier, defaults: &ParseDefaults) -> Option<Shipment> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let guide_idx = pick_guide(&tokens, defaults.country)?;

    let mut draft = Draft::new(carrier);
    draft.guide = Some(tokens[guide_idx].to_ascii_uppercase());

    let mut words = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if i == guide_idx {
            continue;
        }
        if let Some(phone) = normalize_phone(token, defaults.country) {
            draft.phone = Some(phone);
        } else {
            words.push(*token);
        }
    }

    let rest = words.join(" ");
    draft.days = extract_days(&rest);
    let status_words: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .filter(|w| !matches!(fold_accents(w).as_str(), "DIA" | "DIAS" | "D"))
        .collect();
    let detected = detect_carrier(&rest);
    if detected.is_known() {
        draft.carrier = detected;
    }
    if !status_words.is_empty() {
        draft.status_text = Some(status_words.join(" "));
    }
    draft.into_shipment(defaults)
}

fn is_days_field(field: &str) -> bool {
    let folded = fold_accents(field);
    folded.chars().filter(|c| c.is_ascii_alphabetic()).count() <= 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ParseDefaults {
        ParseDefaults {
            carrier: Carrier::Unknown,
            country: Country::Colombia,
            today: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        }
    }

    #[test]
    fn test_delimited_summary_lines() {
        let text = "INTERRAPIDISIMO\n\
                    240012345678 | ENTREGADO | MEDELLIN | 300 123 4567 | 2 días\n\
                    240012345679 | EN TRÁNSITO | CALI";
        let outcome = parse_report(text, &defaults());
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.shipments.len(), 2);

        let first = &outcome.shipments[0];
        assert_eq!(first.id, "240012345678");
        assert_eq!(first.carrier, Carrier::Interrapidisimo);
        assert_eq!(first.status, ShipmentStatus::Delivered);
        assert_eq!(first.phone.as_deref(), Some("3001234567"));
        assert_eq!(first.city(), Some("MEDELLIN"));
        assert_eq!(first.days_in_transit(), Some(2));

        let second = &outcome.shipments[1];
        assert_eq!(second.status, ShipmentStatus::InTransit);
        assert_eq!(second.phone, None);
    }

    #[test]
    fn test_key_value_block_with_events() {
        let text = "Número de Guía: ENV778899\n\
                    Transportadora: Envía\n\
                    Estado Actual: Reclame en oficina\n\
                    Origen: BOGOTA\n\
                    Destino: PASTO\n\
                    2024-05-06 08:00 BOGOTA - Admitido\n\
                    2024-05-08 17:30 PASTO - Disponible en oficina\n";
        let outcome = parse_report(text, &defaults());
        assert_eq!(outcome.shipments.len(), 1);
        let s = &outcome.shipments[0];
        assert_eq!(s.id, "ENV778899");
        assert_eq!(s.carrier, Carrier::Envia);
        assert_eq!(s.status, ShipmentStatus::InOffice);
        // 2024-05-06 to the reference date 2024-05-10.
        assert_eq!(s.days_in_transit(), Some(4));
        let info = s.detailed_info.as_ref().unwrap();
        assert_eq!(info.origin.as_deref(), Some("BOGOTA"));
        assert_eq!(info.events[0].description, "Disponible en oficina");
        assert_eq!(info.raw_status.as_deref(), Some("Reclame en oficina"));
    }

    #[test]
    fn test_blocks_separated_by_new_guide() {
        let text = "Guía: 111111111\nEstado: Entregado\nGuía: 222222222\nEstado: Novedad\n";
        let outcome = parse_report(text, &defaults());
        let statuses: Vec<_> = outcome.shipments.iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![ShipmentStatus::Delivered, ShipmentStatus::Issue]);
    }

    #[test]
    fn test_status_from_latest_event_when_missing() {
        let text = "Guía: 333333333\n01/05/2024 09:00 CALI - En reparto\n02/05/2024 10:00 CALI - Entregado\n";
        let outcome = parse_report(text, &defaults());
        let s = &outcome.shipments[0];
        assert_eq!(s.status, ShipmentStatus::Delivered);
        assert_eq!(s.days_in_transit(), Some(1));
    }

    #[test]
    fn test_spaced_summary_line() {
        let text = "TCC\n555666777 NOVEDAD DIRECCION ERRADA 3109876543";
        let outcome = parse_report(text, &defaults());
        let s = &outcome.shipments[0];
        assert_eq!(s.carrier, Carrier::Tcc);
        assert_eq!(s.status, ShipmentStatus::Issue);
        assert_eq!(s.phone.as_deref(), Some("3109876543"));
    }

    #[test]
    fn test_phone_before_guide() {
        let outcome = parse_report("3001234567 | 240012345678 | ENTREGADO", &defaults());
        let s = &outcome.shipments[0];
        assert_eq!(s.id, "240012345678");
        assert_eq!(s.status, ShipmentStatus::Delivered);
        assert_eq!(s.phone.as_deref(), Some("3001234567"));

        let outcome = parse_report("3109876543 555666777 EN TRANSITO", &defaults());
        assert_eq!(outcome.shipments[0].id, "555666777");
        assert_eq!(outcome.shipments[0].phone.as_deref(), Some("3109876543"));
    }

    #[test]
    fn test_phone_shaped_guide_without_alternative() {
        let outcome = parse_report("3001234567 | ENTREGADO", &defaults());
        assert_eq!(outcome.shipments[0].id, "3001234567");
        assert_eq!(outcome.shipments[0].status, ShipmentStatus::Delivered);
    }

    #[test]
    fn test_duplicate_guides_are_merged() {
        let text = "240012345678 | EN TRANSITO\n240012345678 | ENTREGADO | 3001234567";
        let outcome = parse_report(text, &defaults());
        assert_eq!(outcome.shipments.len(), 1);
        assert_eq!(outcome.shipments[0].status, ShipmentStatus::Delivered);
        assert_eq!(outcome.shipments[0].phone.as_deref(), Some("3001234567"));
    }

    #[test]
    fn test_garbage_lines_become_warnings() {
        let text = "hola equipo, este es el reporte\n240012345678 | ENTREGADO";
        let outcome = parse_report(text, &defaults());
        assert_eq!(outcome.shipments.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("línea 1"));
    }

    #[test]
    fn test_empty_input() {
        let outcome = parse_report("", &defaults());
        assert!(outcome.shipments.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_derive_days_for_delivered_uses_last_event() {
        let d = |day| {
            NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let events = vec![
            ShipmentEvent::new(d(1), "", "Admitido"),
            ShipmentEvent::new(d(4), "", "Entregado"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(
            derive_days_in_transit(&events, ShipmentStatus::Delivered, today),
            Some(3)
        );
        assert_eq!(
            derive_days_in_transit(&events, ShipmentStatus::InTransit, today),
            Some(19)
        );
        assert_eq!(derive_days_in_transit(&[], ShipmentStatus::Pending, today), None);
    }
}
