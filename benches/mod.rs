use criterion::{Criterion, criterion_group, criterion_main};

mod throughput_bench;

fn benches(c: &mut Criterion) {
    throughput_bench::register_benchmarks(c);
}

criterion_group!(sequencer_benches, benches);
criterion_main!(sequencer_benches);
