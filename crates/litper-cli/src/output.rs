use colored::{ColoredString, Colorize};

use litper_analytics::{Alert, DashboardSummary, TrendPoint};
use litper_types::{RiskLevel, Shipment};

use crate::backend::DataSource;

pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg.red());
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "!".yellow(), msg);
}

pub fn risk_label(level: RiskLevel) -> ColoredString {
    let label = level.to_string();
    match level {
        RiskLevel::Normal => label.green(),
        RiskLevel::Watch => label.blue(),
        RiskLevel::Attention => label.yellow(),
        RiskLevel::Urgent => label.red().bold(),
    }
}

pub fn print_summary(summary: &DashboardSummary, source: DataSource) {
    let origin = match source {
        DataSource::Backend => "backend",
        DataSource::Local => "local",
    };
    println!("{} ({})", "Litper dashboard".bold().cyan(), origin.dimmed());
    println!(
        "Envíos: {}  Entregados: {}  Tasa de entrega: {}%  OTIF ({} días): {}%",
        summary.total.to_string().bold(),
        summary.by_status.delivered,
        summary.delivery_rate.to_string().bold(),
        summary.sla_days,
        summary.otif_rate,
    );
    println!(
        "Críticos: {}  Con novedad: {}  Promedio en tránsito: {:.1} días",
        summary.critical_count.to_string().red().bold(),
        summary.issue_count.to_string().yellow(),
        summary.avg_days_in_transit,
    );
    println!(
        "Estados: {} pendientes, {} en tránsito, {} en oficina, {} entregados, {} novedad",
        summary.by_status.pending,
        summary.by_status.in_transit,
        summary.by_status.in_office,
        summary.by_status.delivered,
        summary.by_status.issue,
    );

    if !summary.carriers.is_empty() {
        println!("\n{}", "Transportadoras:".bold());
        for c in &summary.carriers {
            println!(
                "  {:<16} {:>5} envíos  {:>3}% entregado  {} críticos",
                c.carrier.display_name(),
                c.stats.total,
                c.stats.delivery_rate,
                c.stats.critical,
            );
        }
    }
    if !summary.cities.is_empty() {
        println!("\n{}", "Ciudades:".bold());
        for c in summary.cities.iter().take(10) {
            println!(
                "  {:<16} {:>5} envíos  {:>3}% entregado",
                c.city, c.stats.total, c.stats.delivery_rate,
            );
        }
    }
}

pub fn print_trends(points: &[TrendPoint]) {
    println!("\n{}", "Tendencia diaria:".bold());
    for p in points.iter().filter(|p| p.total > 0) {
        println!(
            "  {}  {:>4} envíos  {:>3}% entregado  {} críticos",
            p.date, p.total, p.delivery_rate, p.critical
        );
    }
}

pub fn print_alerts(alerts: &[Alert]) {
    for a in alerts {
        println!(
            "  {:<10} {:<16} {:<14} {:>3} días  {}  {}",
            risk_label(a.level()),
            a.guide,
            a.carrier.display_name(),
            a.days_in_transit,
            a.phone.as_deref().unwrap_or("-"),
            a.risk.reason.dimmed(),
        );
    }
}

pub fn print_shipment(shipment: &Shipment) {
    println!("{} {}", "Guía".bold(), shipment.id.bold().cyan());
    println!("  Transportadora: {}", shipment.carrier);
    println!("  Estado:         {}", shipment.status);
    println!("  Teléfono:       {}", shipment.phone.as_deref().unwrap_or("-"));
    if let Some(info) = &shipment.detailed_info {
        if let Some(origin) = &info.origin {
            println!("  Origen:         {origin}");
        }
        if let Some(destination) = &info.destination {
            println!("  Destino:        {destination}");
        }
        if let Some(days) = info.days_in_transit {
            println!("  Días:           {days}");
        }
    }
    if let Some(risk) = &shipment.risk {
        println!("  Riesgo:         {}  {}", risk_label(risk.level), risk.reason);
        println!("  Acción:         {}", risk.action);
    }
    if let Some(ai) = &shipment.ai_tracking {
        println!("\n{}", "Seguimiento:".bold());
        println!("  {}", ai.summary);
        println!("  Siguiente paso: {} ({:.0}%)", ai.next_step, ai.confidence * 100.0);
    }
    if let Some(info) = &shipment.detailed_info {
        if !info.events.is_empty() {
            println!("\n{}", "Eventos:".bold());
            for e in &info.events {
                println!(
                    "  {}  {:<12} {}",
                    e.timestamp.format("%Y-%m-%d %H:%M"),
                    e.location,
                    e.description
                );
            }
        }
    }
}
