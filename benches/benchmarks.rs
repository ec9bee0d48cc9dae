use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use scopestore::{Action, ReducerFn, State, Store};

fn counter_store() -> Store {
    Store::builder()
        .reducer(
            ReducerFn::new("counter", 0u64, |n: &u64, _: &Action| Some(n + 1)).on(["INCREMENT"]),
        )
        .unwrap()
        .build()
        .unwrap()
}

fn state_read_benchmark(c: &mut Criterion) {
    let store = Store::new(State::new().with("counter", 42u64));

    c.bench_function("state_read", |b| {
        b.iter(|| {
            black_box(store.state_as::<u64>(black_box("counter")));
        });
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let store = counter_store();

    c.bench_function("dispatch", |b| {
        b.iter(|| {
            store.dispatch(black_box(Action::new("INCREMENT"))).unwrap();
        });
    });
}

fn dispatch_unhandled_benchmark(c: &mut Criterion) {
    let store = counter_store();

    c.bench_function("dispatch_unhandled", |b| {
        b.iter(|| {
            store.dispatch(black_box(Action::new("UNKNOWN"))).unwrap();
        });
    });
}

fn listener_fanout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_fanout");

    for listener_count in [1, 10, 100].iter() {
        let store = counter_store();

        for _ in 0..*listener_count {
            store
                .add_typed_listener("counter", |count: &u64| {
                    black_box(count);
                })
                .unwrap();
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(listener_count),
            listener_count,
            |b, _| {
                b.iter(|| {
                    store.dispatch(Action::new("INCREMENT")).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn unrelated_listener_benchmark(c: &mut Criterion) {
    let store = Store::builder()
        .reducer(
            ReducerFn::new("counter", 0u64, |n: &u64, _: &Action| Some(n + 1)).on(["INCREMENT"]),
        )
        .unwrap()
        .reducer(ReducerFn::new("other", 0u64, |_: &u64, _: &Action| None))
        .unwrap()
        .build()
        .unwrap();

    for _ in 0..100 {
        store
            .add_typed_listener("other", |value: &u64| {
                black_box(value);
            })
            .unwrap();
    }

    c.bench_function("unrelated_listeners", |b| {
        b.iter(|| {
            store.dispatch(Action::new("INCREMENT")).unwrap();
        });
    });
}

criterion_group!(
    benches,
    state_read_benchmark,
    dispatch_benchmark,
    dispatch_unhandled_benchmark,
    listener_fanout_benchmark,
    unrelated_listener_benchmark,
);
criterion_main!(benches);
