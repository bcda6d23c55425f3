use serde::{Deserialize, Serialize};

use litper_types::Result;

use crate::ImportFormat;
use crate::book::{ShipmentBook, merge_into};
use crate::phones::{apply_phone_list, parse_phone_list};
use crate::report::{ParseDefaults, ReportParser};
use crate::table::parse_table;

/// What one import did to the book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub format: ImportFormat,
    pub created: usize,
    pub updated: usize,
    pub phones_attached: usize,
    /// Shipments in the book afterwards.
    pub total: usize,
    pub warnings: Vec<String>,
}

/// Parse `text` in the given layout and fold it into `book`.
///
/// Phone lists don't create shipments: they attach to existing ones by
/// guía, and bare phones go to phoneless shipments in the order they were
/// first recorded.
pub fn import_text(
    book: &mut ShipmentBook,
    parser: &dyn ReportParser,
    format: ImportFormat,
    text: &str,
    defaults: &ParseDefaults,
) -> Result<ImportReport> {
    let mut report = ImportReport {
        format,
        ..ImportReport::default()
    };

    match format {
        ImportFormat::Report | ImportFormat::Table => {
            let outcome = match format {
                ImportFormat::Table => parse_table(text, defaults)?,
                _ => parser.parse(text, defaults)?,
            };
            let merged = merge_into(book, outcome.shipments);
            report.created = merged.created;
            report.updated = merged.updated;
            report.warnings = outcome.warnings;
        }
        ImportFormat::Phones => {
            let list = parse_phone_list(text, defaults.country);
            let mut shipments = book.to_vec();
            shipments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            report.phones_attached = apply_phone_list(&mut shipments, &list.entries);
            report.updated = report.phones_attached;
            report.warnings = list.warnings;
            *book = ShipmentBook::from_vec(shipments);
        }
    }

    report.total = book.len();
    Ok(report)
}
