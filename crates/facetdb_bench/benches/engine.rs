//! Benchmarks for the write path, query path, and reindexing.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use facetdb_bench::{bench_record, seeded_db};
use facetdb_core::{Database, Fields, IndexOptions, Value};

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    group.bench_function("unindexed", |b| {
        b.iter_batched(
            || (Database::open_in_memory().unwrap(), bench_record(1)),
            |(db, fields)| db.put("key", &fields).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("two_indexes", |b| {
        b.iter_batched(
            || {
                let db = Database::open_in_memory().unwrap();
                db.create_index("diff", IndexOptions::new()).unwrap();
                db.create_index("common", IndexOptions::new()).unwrap();
                (db, bench_record(1))
            },
            |(db, fields)| db.put("key", &fields).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let db = seeded_db(1000, true);
    let mut narrow = Fields::new();
    narrow.insert("diff".to_string(), Value::from(500));
    let mut wide = Fields::new();
    wide.insert("common".to_string(), Value::from(0));

    let mut group = c.benchmark_group("find");
    group.bench_function("single_match", |b| {
        b.iter(|| db.find(&narrow).unwrap());
    });
    group.bench_function("thousand_matches", |b| {
        b.iter(|| db.find(&wide).unwrap());
    });
    group.finish();
}

fn bench_reindex(c: &mut Criterion) {
    c.bench_function("reindex_all_1k", |b| {
        b.iter_batched(
            || seeded_db(1000, true),
            |db| db.reindex_all().unwrap(),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_put, bench_find, bench_reindex);
criterion_main!(benches);
