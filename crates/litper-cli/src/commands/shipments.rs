use std::time::Duration;

use anyhow::{Result, bail};

use litper_agents::TrackingService;
use litper_analytics::critical_alerts;
use litper_types::RiskLevel;

use crate::output::{print_alerts, print_info, print_shipment};
use crate::state::CliState;

/// Handle the `risk` command: the alert list, optionally one tier only.
pub async fn risk(state: &CliState, level: Option<RiskLevel>, limit: usize) -> Result<()> {
    let shipments = state.load_book().await?.to_vec();
    let alerts: Vec<_> = critical_alerts(&shipments)
        .into_iter()
        .filter(|a| level.is_none_or(|l| a.level() == l))
        .collect();

    if alerts.is_empty() {
        print_info("Sin envíos en riesgo.");
        return Ok(());
    }
    println!("{} envíos requieren atención:", alerts.len());
    print_alerts(&alerts[..alerts.len().min(limit)]);
    if alerts.len() > limit {
        println!("  ... y {} más", alerts.len() - limit);
    }
    Ok(())
}

/// Handle the `shipment` command, optionally refreshing its tracking summary.
pub async fn show(state: &CliState, guide: &str, refresh: bool) -> Result<()> {
    let mut book = state.load_book().await?;
    let key = guide.trim().to_ascii_uppercase();
    let Some(shipment) = book.get_mut(&key) else {
        bail!("Shipment not found: {guide}");
    };

    if refresh {
        let tracking = TrackingService::load(
            state.store(),
            Some(state.assistant()),
            Duration::from_millis(0),
        )
        .await?;
        shipment.ai_tracking = Some(tracking.refresh(shipment).await?);
    }
    print_shipment(shipment);

    if refresh {
        state.save_book(&book).await?;
    }
    Ok(())
}
