use cav_harminv::{harminv, HarminvOpts, SearchBand, TimeSeries};
use criterion::{criterion_group, criterion_main, Criterion};

fn ringdown() -> TimeSeries {
    let dt = 0.02;
    let values = (0..6000)
        .map(|n| {
            let t = n as f64 * dt;
            let a = (-std::f64::consts::PI * 1.6 / 900.0 * t).exp()
                * (2.0 * std::f64::consts::PI * 1.6 * t).cos();
            let b = 0.5
                * (-std::f64::consts::PI * 1.9 / 150.0 * t).exp()
                * (2.0 * std::f64::consts::PI * 1.9 * t).cos();
            a + b
        })
        .collect();
    TimeSeries::uniform(0.0, dt, values).expect("series")
}

fn bench_harminv(c: &mut Criterion) {
    let series = ringdown();
    let band = SearchBand::new(1.75, 0.6);
    let opts = HarminvOpts::default();
    c.bench_function("harminv_throughput", |b| {
        b.iter(|| {
            let _ = harminv(&series, &band, &opts).expect("harminv");
        });
    });
}

criterion_group!(benches, bench_harminv);
criterion_main!(benches);
