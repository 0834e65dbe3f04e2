// Throughput benchmarks for the fabx query pipeline
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use fabx_core::{composition, FieldCatalog, Record};
use fabx_engine::{SearchEngine, SearchPolicy};
use fabx_store::MemoryStore;

fn generate_record(i: usize) -> Record {
    let series = ["6", "9", "3"][i % 3];
    let elem = if i % 2 == 0 {
        format!("{}%cotton {}%polyester", 50 + i % 40, 50 - i % 40)
    } else {
        "95%cotton 5%spandex".to_string()
    };
    Record::from(json!({
        "code": format!("{series}{i:04}"),
        "code_start": series,
        "type_notes": "现货",
        "name": format!("fabric {i}"),
        "weight": 150 + (i % 200),
        "sale_num_year": (i * 7) % 5000,
        "elem": elem,
        "price": 10.0 + (i % 50) as f64,
    }))
}

fn engine_with_records(size: usize) -> SearchEngine {
    let store = Arc::new(MemoryStore::default());
    store.load_records((0..size).map(generate_record).collect());
    SearchEngine::new(store, FieldCatalog::default(), SearchPolicy::default())
}

fn query(v: Value) -> Map<String, Value> {
    v.as_object().unwrap().clone()
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for size in [1000, 10000].iter() {
        let engine = engine_with_records(*size);
        let q = query(json!({
            "weight": "200-300",
            "elem": "cotton>50%",
            "code": "60",
        }));
        group.bench_with_input(BenchmarkId::new("fabx", size), size, |b, _| {
            b.iter(|| rt.block_on(engine.search(black_box(&q))));
        });
    }

    group.finish();
}

fn benchmark_composition(c: &mut Criterion) {
    c.bench_function("composition_evaluate", |b| {
        b.iter(|| {
            composition::evaluate(
                black_box("65%cotton 30%polyester 5%spandex"),
                black_box("cotton>30% + spandex / silk"),
            )
        });
    });
}

criterion_group!(benches, benchmark_search, benchmark_composition);
criterion_main!(benches);
