use anyhow::Result;
use colored::Colorize;

use litper_agents::{AgentCity, RandomMetrics};

use crate::state::CliState;

/// Handle the `city` command: optionally advance, then print the city.
pub async fn handle(state: &CliState, ticks: u32) -> Result<()> {
    let mut city =
        AgentCity::load_or_seed(state.store(), Box::new(RandomMetrics::from_entropy())).await?;
    for _ in 0..ticks {
        city.tick().await?;
    }

    let stats = city.stats();
    println!(
        "{} tick {}: {} agentes ({} trabajando, {} libres, {} fuera de línea)",
        "Ciudad de agentes".bold().cyan(),
        stats.ticks,
        stats.agents,
        stats.working,
        stats.idle,
        stats.offline,
    );
    println!(
        "Tareas: {} completadas, {} fallidas, éxito {:.0}%",
        stats.tasks_completed,
        stats.tasks_failed,
        stats.success_rate * 100.0
    );
    for d in &city.state().districts {
        println!(
            "  {:<12} {:<9} {:>2} agentes  {:>6} procesadas  eficiencia {:.0}%",
            d.name,
            d.country.to_string(),
            d.agent_ids.len(),
            d.processed,
            d.efficiency * 100.0
        );
    }
    Ok(())
}
