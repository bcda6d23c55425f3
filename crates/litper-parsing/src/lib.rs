//! Turns pasted carrier reports, sheet exports and phone lists into
//! normalized [`Shipment`](litper_types::Shipment) records.

pub mod book;
pub mod import;
pub mod normalize;
pub mod phones;
pub mod report;
pub mod table;

pub use book::*;
pub use import::*;
pub use normalize::*;
pub use phones::*;
pub use report::*;
pub use table::*;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use litper_types::LitperError;

/// Layout of a pasted import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    /// Free-form carrier report text.
    #[default]
    Report,
    /// Delimited sheet export with a header row.
    Table,
    /// One phone (optionally with its guía) per line.
    Phones,
}

impl FromStr for ImportFormat {
    type Err = LitperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "reporte" => Ok(ImportFormat::Report),
            "table" | "tabla" | "csv" | "tsv" => Ok(ImportFormat::Table),
            "phones" | "telefonos" => Ok(ImportFormat::Phones),
            other => Err(LitperError::InvalidInput(format!(
                "Unknown import format: {other} (use report, table, phones)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_format_from_str() {
        assert_eq!("Table".parse::<ImportFormat>().unwrap(), ImportFormat::Table);
        assert_eq!("reporte".parse::<ImportFormat>().unwrap(), ImportFormat::Report);
        assert!("xlsx".parse::<ImportFormat>().is_err());
    }
}
