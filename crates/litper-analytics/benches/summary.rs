use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use litper_analytics::{DashboardSummary, critical_alerts};
use litper_types::{Carrier, Shipment, ShipmentStatus};

const CITIES: [&str; 5] = ["Bogotá", "Medellín", "Cali", "Pasto", "Barranquilla"];

fn synthetic(n: usize) -> Vec<Shipment> {
    (0..n)
        .map(|i| {
            let status = ShipmentStatus::ALL[i % ShipmentStatus::ALL.len()];
            let carrier = Carrier::ALL[i % Carrier::ALL.len()];
            Shipment::new(format!("24{i:010}"), carrier, status)
                .with_days_in_transit((i % 12) as u32)
                .with_destination(CITIES[i % CITIES.len()])
        })
        .collect()
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard_summary");

    for size in [100, 1_000, 10_000] {
        let shipments = synthetic(size);
        group.bench_with_input(BenchmarkId::new("compute", size), &shipments, |b, list| {
            b.iter(|| black_box(DashboardSummary::compute(list, 3)));
        });
        group.bench_with_input(BenchmarkId::new("alerts", size), &shipments, |b, list| {
            b.iter(|| black_box(critical_alerts(list)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_summary);
criterion_main!(benches);
