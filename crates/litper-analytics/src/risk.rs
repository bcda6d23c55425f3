use litper_types::{RiskLevel, Shipment, ShipmentRisk, ShipmentStatus};

/// Any undelivered shipment this old is urgent, whatever its status.
pub const URGENT_DAYS: u32 = 5;
/// Days a parcel may wait at a carrier office before it becomes urgent.
pub const OFFICE_GRACE_DAYS: u32 = 4;
/// In-transit or pending shipments this old are put on watch.
pub const WATCH_DAYS: u32 = 3;

/// Classify one shipment. Missing `days_in_transit` counts as zero.
pub fn classify(shipment: &Shipment) -> ShipmentRisk {
    let days = shipment.days_in_transit().unwrap_or(0);

    match shipment.status {
        ShipmentStatus::Delivered => {
            ShipmentRisk::new(RiskLevel::Normal, "Entregado", "Sin acción requerida")
        }
        _ if days >= URGENT_DAYS => ShipmentRisk::new(
            RiskLevel::Urgent,
            format!("{days} días sin entregar ({})", shipment.status),
            "Escalar con la transportadora y contactar al cliente hoy",
        ),
        ShipmentStatus::InOffice if days > OFFICE_GRACE_DAYS => ShipmentRisk::new(
            RiskLevel::Urgent,
            format!("{days} días en oficina"),
            "Llamar al cliente para que retire antes de la devolución",
        ),
        ShipmentStatus::Issue => ShipmentRisk::new(
            RiskLevel::Attention,
            "Novedad reportada por la transportadora",
            "Gestionar la novedad y confirmar datos con el cliente",
        ),
        ShipmentStatus::InOffice => ShipmentRisk::new(
            RiskLevel::Watch,
            format!("En oficina hace {days} días"),
            "Avisar al cliente que puede retirar",
        ),
        ShipmentStatus::InTransit | ShipmentStatus::Pending if days >= WATCH_DAYS => {
            ShipmentRisk::new(
                RiskLevel::Watch,
                format!("{days} días en ruta"),
                "Hacer seguimiento con la transportadora",
            )
        }
        ShipmentStatus::InTransit | ShipmentStatus::Pending => {
            ShipmentRisk::new(RiskLevel::Normal, "Dentro del tiempo esperado", "Sin acción requerida")
        }
    }
}

/// Recompute and cache the risk on every shipment.
pub fn classify_all(shipments: &mut [Shipment]) {
    for shipment in shipments.iter_mut() {
        shipment.risk = Some(classify(shipment));
    }
    tracing::trace!(count = shipments.len(), "classified shipments");
}

/// Risk level without the explanatory text.
pub fn risk_level(shipment: &Shipment) -> RiskLevel {
    classify(shipment).level
}

pub fn is_critical(shipment: &Shipment) -> bool {
    risk_level(shipment).is_critical()
}
