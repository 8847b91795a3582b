//! Registry throughput benchmarks using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ride_ledger::{CallerId, Location, RideRegistry};
use rust_decimal::Decimal;

fn bench_create_ride(c: &mut Criterion) {
    let passenger = CallerId::new("0xPASSENGER");
    let pickup = Location::new(6.5, 3.3).unwrap();
    let dropoff = Location::new(5.0, 7.5).unwrap();

    c.bench_function("create_ride", |b| {
        let registry = RideRegistry::new();
        b.iter(|| {
            black_box(
                registry
                    .create_ride(&passenger, pickup, dropoff, Decimal::TEN)
                    .unwrap(),
            );
        });
    });
}

fn bench_accept_ride(c: &mut Criterion) {
    let passenger = CallerId::new("0xPASSENGER");
    let driver = CallerId::new("0xDRIVER");
    let pickup = Location::new(6.5, 3.3).unwrap();
    let dropoff = Location::new(5.0, 7.5).unwrap();

    c.bench_function("accept_ride", |b| {
        b.iter_batched(
            || {
                let registry = RideRegistry::new();
                let ride = registry
                    .create_ride(&passenger, pickup, dropoff, Decimal::TEN)
                    .unwrap();
                (registry, ride.id)
            },
            |(registry, id)| {
                black_box(registry.accept_ride(&driver, id).unwrap());
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_available_rides(c: &mut Criterion) {
    let passenger = CallerId::new("0xPASSENGER");
    let driver = CallerId::new("0xDRIVER");
    let pickup = Location::new(6.5, 3.3).unwrap();
    let dropoff = Location::new(5.0, 7.5).unwrap();

    let mut group = c.benchmark_group("available_rides");
    for total in [100usize, 1_000, 10_000] {
        let registry = RideRegistry::new();
        for i in 0..total {
            let ride = registry
                .create_ride(&passenger, pickup, dropoff, Decimal::TEN)
                .unwrap();
            // Accept every other ride so the scan has to filter
            if i % 2 == 0 {
                registry.accept_ride(&driver, ride.id).unwrap();
            }
        }

        group.bench_with_input(BenchmarkId::from_parameter(total), &registry, |b, reg| {
            b.iter(|| black_box(reg.available_rides()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create_ride,
    bench_accept_ride,
    bench_available_rides
);
criterion_main!(benches);
