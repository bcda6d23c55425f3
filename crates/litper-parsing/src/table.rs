use litper_types::{LitperError, Result, Shipment};

use crate::normalize::{detect_carrier, fold_accents, normalize_phone, normalize_status};
use crate::report::{ParseDefaults, ParseOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Guide,
    Status,
    Phone,
    Carrier,
    Origin,
    Destination,
    Days,
}

fn column_for(header: &str) -> Option<Column> {
    let folded = fold_accents(header.trim().trim_matches('"'));
    let column = if folded.contains("GUIA") || folded == "TRACKING" {
        Column::Guide
    } else if folded.contains("ESTADO") {
        Column::Status
    } else if folded.contains("TELEFONO") || folded.contains("CELULAR") || folded == "TEL" {
        Column::Phone
    } else if folded.contains("TRANSPORTADORA") || folded == "CARRIER" {
        Column::Carrier
    } else if folded.contains("ORIGEN") {
        Column::Origin
    } else if folded.contains("DESTINO") || folded.contains("CIUDAD") {
        Column::Destination
    } else if folded.contains("DIAS") {
        Column::Days
    } else {
        return None;
    };
    Some(column)
}

fn detect_delimiter(header: &str) -> char {
    ['\t', ';', ',']
        .into_iter()
        .max_by_key(|d| header.matches(*d).count())
        .filter(|d| header.contains(*d))
        .unwrap_or('\t')
}

/// Parse a delimited sheet export (the text a spreadsheet produces when
/// copied) using the GUIA / ESTADO / TELEFONO / TRANSPORTADORA / DESTINO /
/// DIAS column mapping.
pub fn parse_table(text: &str, defaults: &ParseDefaults) -> Result<ParseOutcome> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Ok(ParseOutcome::default());
    };

    let delimiter = detect_delimiter(header);
    let columns: Vec<Option<Column>> = header.split(delimiter).map(column_for).collect();
    if !columns.contains(&Some(Column::Guide)) {
        return Err(LitperError::Parse(
            "falta la columna GUIA en el encabezado".to_string(),
        ));
    }

    let mut outcome = ParseOutcome::default();
    for (idx, line) in lines {
        let cells: Vec<&str> = line
            .split(delimiter)
            .map(|c| c.trim().trim_matches('"').trim())
            .collect();
        match row_to_shipment(&columns, &cells, defaults) {
            Some(shipment) => outcome.push(shipment),
            None => outcome
                .warnings
                .push(format!("fila {}: sin número de guía", idx + 1)),
        }
    }

    tracing::debug!(
        rows = outcome.shipments.len(),
        warnings = outcome.warnings.len(),
        "parsed table import"
    );
    Ok(outcome)
}

fn row_to_shipment(
    columns: &[Option<Column>],
    cells: &[&str],
    defaults: &ParseDefaults,
) -> Option<Shipment> {
    let cell = |wanted: Column| {
        columns
            .iter()
            .position(|c| *c == Some(wanted))
            .and_then(|i| cells.get(i).copied())
            .filter(|v| !v.is_empty())
    };

    let guide = cell(Column::Guide)?.to_ascii_uppercase();
    let status_text = cell(Column::Status);
    let status = status_text.map(normalize_status).unwrap_or_default();
    let carrier = cell(Column::Carrier)
        .map(detect_carrier)
        .filter(|c| c.is_known())
        .unwrap_or(defaults.carrier);

    let mut shipment = Shipment::new(guide, carrier, status).with_country(defaults.country);
    shipment.phone = cell(Column::Phone).and_then(|p| normalize_phone(p, defaults.country));

    let origin = cell(Column::Origin);
    let destination = cell(Column::Destination);
    let days = cell(Column::Days).and_then(|d| {
        d.split(|c: char| !c.is_ascii_digit())
            .find(|s| !s.is_empty())
            .and_then(|s| s.parse::<u32>().ok())
    });

    if status_text.is_some() || origin.is_some() || destination.is_some() || days.is_some() {
        let detail = shipment.detail_mut();
        detail.raw_status = status_text.map(str::to_string);
        detail.origin = origin.map(str::to_string);
        detail.destination = destination.map(str::to_string);
        detail.days_in_transit = days;
    }
    Some(shipment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use litper_types::{Carrier, Country, ShipmentStatus};

    fn defaults() -> ParseDefaults {
        ParseDefaults {
            carrier: Carrier::Unknown,
            country: Country::Colombia,
            today: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        }
    }

    #[test]
    fn test_tab_separated_sheet() {
        let text = "GUIA\tESTADO\tTELEFONO\tTRANSPORTADORA\tDESTINO\tDIAS\n\
                    240012345678\tENTREGADO\t3001234567\tInterrapidísimo\tMedellín\t2\n\
                    ENV998877\tEN OFICINA\t\tEnvía\tPasto\t6\n";
        let outcome = parse_table(text, &defaults()).unwrap();
        assert_eq!(outcome.shipments.len(), 2);
        let first = &outcome.shipments[0];
        assert_eq!(first.carrier, Carrier::Interrapidisimo);
        assert_eq!(first.status, ShipmentStatus::Delivered);
        assert_eq!(first.phone.as_deref(), Some("3001234567"));
        assert_eq!(first.city(), Some("Medellín"));
        let second = &outcome.shipments[1];
        assert_eq!(second.status, ShipmentStatus::InOffice);
        assert_eq!(second.phone, None);
        assert_eq!(second.days_in_transit(), Some(6));
    }

    #[test]
    fn test_semicolon_sheet_with_accented_headers() {
        let text = "Guía;Estado;Días\n111222333;En tránsito;3 días\n";
        let outcome = parse_table(text, &defaults()).unwrap();
        let s = &outcome.shipments[0];
        assert_eq!(s.status, ShipmentStatus::InTransit);
        assert_eq!(s.days_in_transit(), Some(3));
    }

    #[test]
    fn test_missing_guide_column_is_an_error() {
        let err = parse_table("ESTADO,TELEFONO\nENTREGADO,3001234567", &defaults()).unwrap_err();
        assert!(matches!(err, LitperError::Parse(_)));
    }

    #[test]
    fn test_rows_without_guide_are_warnings() {
        let text = "GUIA,ESTADO\n,ENTREGADO\n123456789,ENTREGADO\n";
        let outcome = parse_table(text, &defaults()).unwrap();
        assert_eq!(outcome.shipments.len(), 1);
        assert_eq!(outcome.warnings, vec!["fila 2: sin número de guía".to_string()]);
    }

    #[test]
    fn test_empty_table() {
        let outcome = parse_table("\n\n", &defaults()).unwrap();
        assert!(outcome.shipments.is_empty());
    }
}
