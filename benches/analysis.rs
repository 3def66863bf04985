use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use factorstats::stats::{anova, pairwise_tukey, FactorColumn, Response};
use factorstats::table::WideTable;
use factorstats::do_stats;

const FACTORS: [&str; 4] = ["Group", "Storage", "Heart", "Time"];
const LEVELS: [usize; 4] = [2, 2, 2, 4];

/// Full factorial with `reps` units per cell and a few parameters.
fn design(k: usize, reps: usize) -> WideTable {
    let cells: usize = LEVELS[..k].iter().product();
    let n = cells * reps;

    let mut table = WideTable::new();
    let mut stride = reps;
    for f in 0..k {
        let labels: Vec<String> = (0..n).map(|i| ((i / stride) % LEVELS[f]).to_string()).collect();
        table = table.with_factor(FACTORS[f], labels).unwrap();
        stride *= LEVELS[f];
    }
    for p in 0..3 {
        // deterministic pseudo-noise
        let values = (0..n)
            .map(|i| ((i * 7919 + p * 104_729) % 1000) as f64 / 100.0 + (i % cells) as f64)
            .collect();
        table = table.with_numeric(format!("P{p}"), values).unwrap();
    }
    table
}

fn bench_anova(c: &mut Criterion) {
    let mut group = c.benchmark_group("ANOVA");

    for k in [1, 2, 3, 4] {
        let wide = design(k, 4);
        let values = wide.numeric("P0").unwrap().to_vec();
        let factors: Vec<FactorColumn<'_>> = FACTORS[..k]
            .iter()
            .map(|&name| FactorColumn {
                name,
                labels: wide.factor(name).unwrap().iter().filter_map(Option::as_deref).collect(),
            })
            .collect();
        let response = Response { name: "P0", values };

        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, _| {
            b.iter(|| anova(&response, &factors).unwrap());
        });
    }
    group.finish();
}

fn bench_tukey(c: &mut Criterion) {
    let wide = design(4, 6);
    let response = Response {
        name: "P0",
        values: wide.numeric("P0").unwrap().to_vec(),
    };
    let time = FactorColumn {
        name: "Time",
        labels: wide.factor("Time").unwrap().iter().filter_map(Option::as_deref).collect(),
    };

    c.bench_function("Tukey_4_levels", |b| {
        b.iter(|| pairwise_tukey(&response, &time).unwrap());
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline_InMemory");
    group.sample_size(20);

    for k in [2, 3, 4] {
        let wide = design(k, 3);
        let factors = &FACTORS[..k];
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, _| {
            b.iter(|| do_stats(&wide, factors, factors, "bench", false).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_anova, bench_tukey, bench_pipeline);
criterion_main!(benches);
