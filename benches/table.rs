use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use chain_table::{Config, HashTable};
use nanoid::nanoid;

fn table_find_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("table find");

    for item_count in [1_000, 100_000, 1_000_000] {
        let mut table = HashTable::new().unwrap();

        table.insert("abc_w5wa35aw35naw", vec![1, 2, 3]).unwrap();

        for _ in 0..item_count {
            table.insert(format!("abc_{}", nanoid!()), vec![]).unwrap();
        }

        group.bench_function(BenchmarkId::new("hit", item_count), |b| {
            b.iter(|| {
                assert_eq!(
                    [1, 2, 3],
                    &**table.find("abc_w5wa35aw35naw").unwrap().unwrap().value(),
                )
            });
        });

        group.bench_function(BenchmarkId::new("miss", item_count), |b| {
            b.iter(|| assert!(table.find("abc_missing").unwrap().is_none()));
        });
    }
}

fn table_find_int(c: &mut Criterion) {
    let mut table = HashTable::new().unwrap();

    for n in 0..1_000_000 {
        table.insert_int(n, n).unwrap();
    }

    c.bench_function("table find int", |b| {
        let mut n = 0;

        b.iter(|| {
            n = (n + 7_919) % 1_000_000;
            assert_eq!(&n, table.find_int(n).unwrap().value());
        });
    });
}

fn table_insert(c: &mut Criterion) {
    let keys = (0..100_000).map(|_| nanoid!()).collect::<Vec<_>>();

    c.bench_function("table insert 100K (growing)", |b| {
        b.iter_batched(
            || HashTable::new().unwrap(),
            |mut table| {
                for key in &keys {
                    table.insert(key, ()).unwrap();
                }
                table
            },
            BatchSize::LargeInput,
        );
    });

    c.bench_function("table insert 100K (presized)", |b| {
        b.iter_batched(
            || Config::new().min_buckets(131_072).build().unwrap(),
            |mut table| {
                for key in &keys {
                    table.insert(key, ()).unwrap();
                }
                table
            },
            BatchSize::LargeInput,
        );
    });
}

fn table_insert_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("table insert + delete 10K");

    for shrink in [true, false] {
        group.bench_function(BenchmarkId::new("shrink", shrink), |b| {
            let mut table = Config::new().shrink(shrink).build().unwrap();

            b.iter(|| {
                for n in 0..10_000 {
                    table.insert_int(n, ()).unwrap();
                }
                for n in 0..10_000 {
                    table.delete_int(n).unwrap();
                }
            });
        });
    }
}

fn table_iter(c: &mut Criterion) {
    let mut table = HashTable::new().unwrap();

    for n in 0..100_000 {
        table.insert_int(n, n).unwrap();
    }

    c.bench_function("table iter 100K", |b| {
        b.iter(|| assert_eq!(100_000, table.iter().count()));
    });
}

criterion_group!(
    benches,
    table_find_hit,
    table_find_int,
    table_insert,
    table_insert_delete,
    table_iter,
);
criterion_main!(benches);
