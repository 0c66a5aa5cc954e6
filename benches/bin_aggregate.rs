use criterion::{black_box, criterion_group, criterion_main, Criterion};

use euvmt::binning::{BinField, BinnedAggregate, BinningParams, HorizontalAxis};
use euvmt::observations::{Direction, Location, Observation, OrbitTag};
use euvmt::table::CombinedTable;

/// `n_profiles` synthetic profiles of 200 levels spread over longitude and local time.
fn synthetic_table(n_profiles: usize) -> CombinedTable {
    let mut rows = Vec::with_capacity(n_profiles * 200);
    for p in 0..n_profiles {
        let location = Location {
            lat: -60.0 + (p * 7 % 120) as f64,
            lon: (p * 37 % 360) as f64 + 0.5,
            lst: (p * 5 % 24) as f64 + 0.25,
            unixtime: 1_450_000_000.0 + p as f64 * 3_600.0,
        };
        let tag = OrbitTag {
            orbit: Some(701 + (p % 298) as u32),
            direction: if p % 2 == 0 {
                Direction::Inbound
            } else {
                Direction::Outbound
            },
        };
        for level in 0..200 {
            let alt = 80.0 + level as f64 * 0.85;
            let temp = 130.0 + 0.4 * alt + ((p + level) % 11) as f64;
            let pressure = 1.0e-2 * (-(alt - 80.0) / 9.0).exp();
            rows.push(Observation::new(alt, temp, pressure, None, &location, tag));
        }
    }
    rows.into_iter().collect()
}

fn bench_compute(c: &mut Criterion) {
    let table = synthetic_table(2_000);
    let by_altitude = BinningParams::default();
    let by_pressure = BinningParams::builder()
        .x_axis(HorizontalAxis::LocalSolarTime)
        .pressure_bins(50)
        .build()
        .unwrap();

    c.bench_function("compute lon x alt (400k rows)", |b| {
        b.iter(|| BinnedAggregate::compute(black_box(&table), black_box(&by_altitude)).unwrap())
    });
    c.bench_function("compute lst x pres (400k rows)", |b| {
        b.iter(|| BinnedAggregate::compute(black_box(&table), black_box(&by_pressure)).unwrap())
    });
}

fn bench_stability_grid(c: &mut Criterion) {
    let table = synthetic_table(2_000);
    let aggregate = BinnedAggregate::compute(&table, &BinningParams::default()).unwrap();

    c.bench_function("N² grid", |b| {
        b.iter(|| aggregate.grid(black_box(BinField::BuoyancyFrequency)).unwrap())
    });
}

criterion_group!(benches, bench_compute, bench_stability_grid);
criterion_main!(benches);
