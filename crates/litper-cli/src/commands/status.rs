use anyhow::Result;

use crate::backend::{summary_with_fallback, trends_with_fallback};
use crate::output::{print_info, print_summary, print_trends};
use crate::state::CliState;

/// Handle the `status` command: dashboard numbers from the backend when
/// one answers, otherwise from the local book.
pub async fn handle(state: &CliState, local_only: bool, trend_days: Option<u32>) -> Result<()> {
    let backend = if local_only { None } else { state.backend()? };
    let shipments = state.load_book().await?.to_vec();

    let (summary, source) =
        summary_with_fallback(backend.as_ref(), &shipments, state.config.sla_days).await;
    if summary.total == 0 {
        print_info("No hay envíos cargados. Usa `litper import <archivo>`.");
        return Ok(());
    }
    print_summary(&summary, source);

    if let Some(days) = trend_days {
        let (points, _) = trends_with_fallback(backend.as_ref(), &shipments, days).await;
        print_trends(&points);
    }
    Ok(())
}
