
use config_generator::generate_config;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hyprconf::{Config, ConfigOptions, tokenize};

// Generated inputs exceed the default size limit
fn unbounded() -> Config {
    Config::with_options(ConfigOptions {
        max_size: usize::MAX,
        ..ConfigOptions::default()
    })
}

fn parsing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for lines in [50, 300, 1_000, 10_000] {
        let input = generate_config(lines);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("tokenize", lines), &input, |b, input| {
            b.iter(|| tokenize(input).len())
        });
        group.bench_with_input(BenchmarkId::new("parse", lines), &input, |b, input| {
            b.iter(|| {
                let mut config = unbounded();
                config.parse(input).map(|_| config.document().categories.len())
            })
        });
    }

    group.finish();
}

fn large_input_benchmark(c: &mut Criterion) {
    let input = generate_config(1_000_000);

    let mut group = c.benchmark_group("large_input");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("parse_1M_lines", |b| {
        b.iter(|| {
            let mut config = unbounded();
            config.parse(&input).is_ok()
        })
    });
    group.finish();
}

criterion_group!(benches, parsing_benchmarks, large_input_benchmark);
criterion_main!(benches);
