use criterion::BatchSize;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use std::hint::black_box;

use blockbridge::blocks::Copy;
use blockbridge::blocks::KeepOneInN;
use blockbridge::runtime::Mocker;
use blockbridge::runtime::forecast;

const N: usize = 8192;

pub fn resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("forecast");

    group.bench_function("decimator", |b| {
        let mut required = [0usize; 2];
        b.iter(|| {
            forecast::resolve(
                black_box(N),
                black_box(&[N, N / 3]),
                &mut required,
                |n, r| r.fill(n * 8),
            )
        });
    });

    group.bench_function("history", |b| {
        let mut required = [0usize];
        b.iter(|| {
            forecast::resolve(black_box(N), black_box(&[N / 2]), &mut required, |n, r| {
                r.fill(n + 63)
            })
        });
    });

    group.finish();
}

pub fn mocker(c: &mut Criterion) {
    let input: Vec<f32> = (0..N).map(|x| x as f32).collect();
    let mut group = c.benchmark_group("mocker");

    group.bench_function("copy", |b| {
        b.iter_batched(
            || {
                let mut mocker = Mocker::new(Copy::<f32>::new());
                mocker.init();
                mocker.input(0, input.clone());
                mocker.init_output::<f32>(0, N);
                mocker
            },
            |mut mocker| {
                mocker.run();
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("keep_one_in_n", |b| {
        b.iter_batched(
            || {
                let mut mocker = Mocker::new(KeepOneInN::<f32>::new(4));
                mocker.init();
                mocker.input(0, input.clone());
                mocker.init_output::<f32>(0, N / 4);
                mocker
            },
            |mut mocker| {
                mocker.run();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, resolve, mocker);
criterion_main!(benches);
