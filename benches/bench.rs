use bkthmm::engine::BktModel;
use bkthmm::params::HmmParams;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    let params = HmmParams::random(2, 2, 0).unwrap();
    for &n_seqs in &[10usize, 100] {
        let seqs: Vec<_> = (0..n_seqs)
            .map(|i| params.sample(50, i as u64).unwrap().observations())
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n_seqs), &seqs, |b, seqs| {
            b.iter(|| {
                let mut model = BktModel::new(2, 2)
                    .unwrap()
                    .with_seed(1)
                    .unwrap()
                    .with_max_iter(10);
                model.fit(black_box(seqs)).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let params = HmmParams::random(2, 2, 0).unwrap();
    let obs = params.sample(1000, 7).unwrap().observations();
    c.bench_function("viterbi 1000", |b| {
        b.iter(|| params.viterbi(black_box(&obs)).unwrap())
    });
    c.bench_function("forward 1000", |b| {
        b.iter(|| params.forward(black_box(&obs)).unwrap())
    });
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
