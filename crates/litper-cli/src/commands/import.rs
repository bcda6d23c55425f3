use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use litper_parsing::{
    ImportFormat, ImportReport, LineReportParser, ParseDefaults, detect_carrier, import_text,
};
use litper_types::Country;

use crate::output::{print_success, print_warning};
use crate::state::CliState;

/// Read `path` ("-" for stdin) and merge it into the saved book.
pub async fn handle(
    state: &CliState,
    path: &Path,
    format: ImportFormat,
    carrier: Option<&str>,
    country: Option<Country>,
) -> Result<ImportReport> {
    let text = read_input(path)?;
    let defaults = ParseDefaults {
        carrier: carrier.map(detect_carrier).unwrap_or_default(),
        country: country.unwrap_or(state.config.default_country),
        ..ParseDefaults::default()
    };

    let mut book = state.load_book().await?;
    let report = import_text(&mut book, &LineReportParser, format, &text, &defaults)?;
    state.save_book(&book).await?;

    match format {
        ImportFormat::Phones => print_success(&format!(
            "{} teléfonos asignados ({} envíos en total)",
            report.phones_attached, report.total
        )),
        _ => print_success(&format!(
            "{} nuevos, {} actualizados ({} envíos en total)",
            report.created, report.updated, report.total
        )),
    }
    for warning in &report.warnings {
        print_warning(warning);
    }
    Ok(report)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LitperConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_import_persists_book() {
        let dir = tempdir().unwrap();
        let state = CliState::new(LitperConfig::default(), dir.path().to_path_buf());

        let report_path = dir.path().join("reporte.txt");
        std::fs::write(
            &report_path,
            "240012345678 | ENTREGADO | MEDELLIN\n240012345679 | EN OFICINA | PASTO | 6 días\n",
        )
        .unwrap();
        let report = handle(&state, &report_path, ImportFormat::Report, Some("interrapidísimo"), None)
            .await
            .unwrap();
        assert_eq!(report.created, 2);

        let phones_path = dir.path().join("telefonos.txt");
        std::fs::write(&phones_path, "240012345679 3001234567\n").unwrap();
        handle(&state, &phones_path, ImportFormat::Phones, None, None)
            .await
            .unwrap();

        let book = state.load_book().await.unwrap();
        assert_eq!(book.len(), 2);
        let office = book.get("240012345679").unwrap();
        assert_eq!(office.phone.as_deref(), Some("3001234567"));
        assert!(office.risk.as_ref().unwrap().level.is_critical());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let state = CliState::new(LitperConfig::default(), dir.path().to_path_buf());
        let missing = dir.path().join("nope.txt");
        assert!(handle(&state, &missing, ImportFormat::Report, None, None).await.is_err());
    }
}
