use anyhow::Result;

use litper_agents::{NewPedido, OrdersService};
use litper_types::Pedido;

use crate::cli::PedidoAction;
use crate::output::{print_info, print_success};
use crate::state::CliState;

/// Handle pedido subcommands.
pub async fn handle(state: &CliState, action: PedidoAction) -> Result<()> {
    let service = OrdersService::load(state.store()).await?;

    match action {
        PedidoAction::Create {
            customer,
            city,
            product,
            value,
            phone,
        } => {
            let pedido = service
                .create(NewPedido {
                    customer,
                    city,
                    product,
                    value,
                    phone,
                })
                .await?;
            print_success(&format!("Pedido creado: {}", pedido.id));
        }

        PedidoAction::List => {
            let list = service.list();
            if list.is_empty() {
                print_info("Sin pedidos registrados.");
            }
            for p in &list {
                print_pedido(p);
            }
        }

        PedidoAction::Transition { id, event, guide } => {
            let pedido = service.transition(id, event, guide).await?;
            print_success(&format!("Pedido {} → {:?}", &pedido.id.to_string()[..8], pedido.status));
        }

        PedidoAction::Stats => {
            let s = service.stats();
            println!(
                "Pedidos: {} total ({} pendientes, {} confirmados, {} despachados, {} entregados, {} cancelados, {} devueltos)",
                s.total, s.pending, s.confirmed, s.dispatched, s.delivered, s.cancelled, s.returned
            );
            println!("Valor entregado: ${:.0}", s.delivered_value);
        }
    }
    Ok(())
}

fn print_pedido(p: &Pedido) {
    println!(
        "  {} {:<20} {:<12} {:<20} ${:>10.0}  {:?}{}",
        &p.id.to_string()[..8],
        p.customer,
        p.city,
        p.product,
        p.value,
        p.status,
        p.guide
            .as_deref()
            .map(|g| format!(" [guía {g}]"))
            .unwrap_or_default(),
    );
}
