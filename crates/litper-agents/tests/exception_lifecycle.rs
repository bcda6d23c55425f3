use std::sync::Arc;

use litper_agents::*;
use litper_parsing::{ParseDefaults, parse_report};
use litper_store::MemoryStore;
use litper_types::*;

const REPORT: &str = "TCC\n\
                      555666777 | NOVEDAD DIRECCION ERRADA | CALI | 3109876543\n\
                      555666778 | ENTREGADO | CALI\n";

/// Report with an issue → novedad → contact attempts → escalation.
#[tokio::test]
async fn test_issue_escalates_after_failed_attempts() {
    let shipments = parse_report(REPORT, &ParseDefaults::default()).shipments;
    assert_eq!(shipments.len(), 2);

    let store = Arc::new(MemoryStore::new());
    let service = NovedadesService::load(store.clone()).await.unwrap();
    let created = service.detect(&shipments).await.unwrap();
    assert_eq!(created.len(), 1);
    let novedad = &created[0];
    assert_eq!(novedad.guide, "555666777");
    assert_eq!(novedad.kind, NovedadKind::DireccionErrada);

    let plan = service.plan(novedad.id).unwrap();
    assert!(!plan.escalates());
    assert!(!plan.actions.is_empty());

    let mut last = None;
    for _ in 0..=MAX_ATTEMPTS {
        last = Some(service.start(novedad.id).await.unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.status, NovedadStatus::Escalated);
    assert!(service.plan(novedad.id).unwrap().escalates());

    // Escalated cases can still be closed by an operator.
    let resolved = service.resolve(novedad.id, "Entregado en portería").await.unwrap();
    assert_eq!(resolved.status, NovedadStatus::Resolved);

    let reloaded = NovedadesService::load(store).await.unwrap();
    assert_eq!(reloaded.stats().resolved, 1);
}

/// An order dispatched with a guía can be matched to the imported shipment.
#[tokio::test]
async fn test_order_guide_links_to_shipment() {
    let shipments = parse_report(REPORT, &ParseDefaults::default()).shipments;
    let orders = OrdersService::load(Arc::new(MemoryStore::new())).await.unwrap();

    let pedido = orders
        .create(NewPedido {
            customer: "Ana Torres".into(),
            city: "Cali".into(),
            product: "Zapatos".into(),
            value: 99_000.0,
            phone: None,
        })
        .await
        .unwrap();
    orders.transition(pedido.id, PedidoEvent::Confirm, None).await.unwrap();
    let dispatched = orders
        .transition(pedido.id, PedidoEvent::Dispatch, Some("555666778".into()))
        .await
        .unwrap();

    let shipment = shipments
        .iter()
        .find(|s| Some(s.id.as_str()) == dispatched.guide.as_deref())
        .unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Delivered);

    orders.transition(pedido.id, PedidoEvent::Deliver, None).await.unwrap();
    assert_eq!(orders.stats().delivered, 1);
}
