use anyhow::Result;
use colored::Colorize;

use litper_agents::{NovedadesService, ResponseAction};
use litper_types::Novedad;

use crate::cli::NovedadAction;
use crate::output::{print_info, print_success};
use crate::state::CliState;

/// Handle novedad subcommands.
pub async fn handle(state: &CliState, action: NovedadAction) -> Result<()> {
    let service = NovedadesService::load(state.store()).await?;

    match action {
        NovedadAction::Detect => {
            let shipments = state.load_book().await?.to_vec();
            let created = service.detect(&shipments).await?;
            if created.is_empty() {
                print_info("No hay novedades nuevas.");
            } else {
                print_success(&format!("{} novedades abiertas", created.len()));
                for n in &created {
                    print_novedad(n);
                }
            }
        }

        NovedadAction::List => {
            let list = service.list();
            if list.is_empty() {
                print_info("Sin novedades registradas.");
            }
            for n in &list {
                print_novedad(n);
            }
        }

        NovedadAction::Plan { id } => {
            let plan = service.plan(id)?;
            println!("{}", plan.justification.bold());
            for action in &plan.actions {
                println!("  - {}", describe(action));
            }
        }

        NovedadAction::Start { id } => {
            let n = service.start(id).await?;
            print_success(&format!("Intento {} registrado ({:?})", n.attempts, n.status));
        }

        NovedadAction::Resolve { id, resolution } => {
            service.resolve(id, resolution).await?;
            print_success("Novedad resuelta");
        }

        NovedadAction::Escalate { id, reason } => {
            service.escalate(id, reason).await?;
            print_success("Novedad escalada");
        }

        NovedadAction::Stats => {
            let stats = service.stats();
            println!(
                "Novedades: {} total ({} abiertas, {} en gestión, {} resueltas, {} escaladas)",
                stats.total, stats.open, stats.in_progress, stats.resolved, stats.escalated
            );
            println!("Tasa de resolución: {:.0}%", stats.resolution_rate * 100.0);
            let mut kinds: Vec<_> = stats.by_kind.iter().collect();
            kinds.sort_by(|a, b| b.1.cmp(a.1));
            for (kind, count) in kinds {
                println!("  {kind:?}: {count}");
            }
        }
    }
    Ok(())
}

fn print_novedad(n: &Novedad) {
    println!(
        "  {} {:<16} {:<14} {:?}/{:?}  intentos: {}  {}",
        &n.id.to_string()[..8],
        n.guide,
        n.carrier.display_name(),
        n.kind,
        n.status,
        n.attempts,
        n.description.dimmed(),
    );
}

fn describe(action: &ResponseAction) -> String {
    match action {
        ResponseAction::ContactCustomer {
            channel, message, ..
        } => format!("Contactar al cliente por {channel:?}: {message}"),
        ResponseAction::VerifyAddress { guide } => format!("Verificar dirección de {guide}"),
        ResponseAction::Reschedule { guide } => format!("Reprogramar entrega de {guide}"),
        ResponseAction::RequestCarrierReview { guide, carrier } => {
            format!("Solicitar revisión a {carrier} para {guide}")
        }
        ResponseAction::ReturnToSender { guide } => format!("Devolver {guide} al remitente"),
        ResponseAction::Escalate { guide, reason } => format!("Escalar {guide}: {reason}"),
    }
}
