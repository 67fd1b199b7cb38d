//! # Filter Engine Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Flatten a typical webhook payload | < 20µs |
//! | Compare against a multi-operator filter | < 5µs |
//! | Registry `test_filter` with wildcard fallback | < 50µs |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use serde_json::{json, Value};
use wh_event_filters::{
    compare, flatten, FilterRegistryApi, FilterRegistryService, FilterSpec, Flattener,
    InMemoryFilterStore,
};

fn payload(items: usize) -> Value {
    let mut rng = rand::thread_rng();
    let lines: Vec<Value> = (0..items)
        .map(|i| {
            json!({
                "sku": format!("SKU-{i}"),
                "quantity": rng.gen_range(1..10),
                "price": rng.gen_range(1.0..500.0),
                "tags": ["retail", "eu"]
            })
        })
        .collect();
    json!({
        "event": "order.created",
        "data": {
            "customer": {"id": "cus_123", "tier": "gold", "country": "NG"},
            "amount": 1250,
            "currency": "NGN",
            "lines": lines
        }
    })
}

fn filter_document() -> Value {
    json!({
        "data": {
            "amount": {"$gte": 1000, "$lt": 100000},
            "currency": {"$in": ["NGN", "GHS", "KES"]},
            "customer": {"tier": {"$neq": "free"}, "id": {"$exist": true}}
        },
        "$or": [
            {"data": {"customer": {"country": "NG"}}},
            {"data": {"customer": {"country": "GH"}}}
        ]
    })
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for items in [1, 10, 100] {
        let value = payload(items);
        group.throughput(Throughput::Elements(items as u64));
        group.bench_with_input(BenchmarkId::new("payload_lines", items), &value, |b, v| {
            b.iter(|| black_box(flatten(v).unwrap()))
        });
    }

    let flattener = Flattener::default();
    let filter = filter_document();
    group.bench_function("filter_document", |b| {
        b.iter(|| black_box(flattener.flatten(&filter).unwrap()))
    });

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    let filter = flatten(&filter_document()).unwrap();
    for items in [1, 10, 100] {
        let flat = flatten(&payload(items)).unwrap();
        group.bench_with_input(BenchmarkId::new("payload_lines", items), &flat, |b, p| {
            b.iter(|| black_box(compare(p, &filter)))
        });
    }

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.measurement_time(Duration::from_secs(5));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let service = FilterRegistryService::new(Arc::new(InMemoryFilterStore::new()));
    let body = flatten(&filter_document()).unwrap();
    runtime
        .block_on(service.create_filters(
            (0..1000)
                .map(|i| FilterSpec::new(format!("sub-{i}"), "*").with_body(body.clone()))
                .collect(),
        ))
        .unwrap();

    let value = payload(10);
    group.bench_function("test_filter_wildcard", |b| {
        b.iter(|| {
            black_box(
                runtime
                    .block_on(service.test_filter("sub-500", "order.created", &value))
                    .unwrap(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_compare, bench_registry);
criterion_main!(benches);
