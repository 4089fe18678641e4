// Random operation sequences, checked against std's HashMap

use chain_table::{Config, HashTable, Status};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use test_log::test;

fn run_model(seed: u64, ops: usize, key_space: u32, table: &mut HashTable<u32>) -> chain_table::Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = HashMap::<String, u32>::new();

    for step in 0..ops {
        let key = format!("key:{}", rng.random_range(0..key_space));

        match rng.random_range(0..10) {
            0..5 => {
                let value = rng.random::<u32>();
                let status = table.insert(&key, value)?;

                match model.insert(key.clone(), value) {
                    Some(_) => assert_eq!(Status::UpdatedExisting, status, "step {step}"),
                    None => assert!(status.is_new_entry(), "step {step}"),
                }
            }
            5..8 => {
                assert_eq!(model.remove(&key), table.delete(&key)?, "step {step}");
            }
            _ => {
                assert_eq!(
                    model.get(&key),
                    table.find(&key)?.map(|node| node.value()),
                    "step {step}"
                );
            }
        }

        assert_eq!(model.len() as u32, table.count(), "step {step}");
        assert!(table.bucket_count().is_power_of_two());
        assert!(table.bucket_count() >= table.min_buckets());
    }

    assert_eq!(table.count(), table.count_by_walk());

    for (key, value) in &model {
        assert_eq!(Some(value), table.find(key)?.map(|node| node.value()));
    }

    Ok(())
}

#[test]
fn model_small_key_space() -> chain_table::Result<()> {
    for seed in 0..10 {
        let mut table = HashTable::new()?;
        run_model(seed, 2_000, 50, &mut table)?;
    }
    Ok(())
}

#[test]
fn model_large_key_space() -> chain_table::Result<()> {
    let mut table = HashTable::new()?;
    run_model(1337, 20_000, 10_000, &mut table)
}

#[test]
fn model_no_shrink() -> chain_table::Result<()> {
    let mut table = Config::new().shrink(false).min_buckets(2).build()?;
    run_model(42, 10_000, 500, &mut table)
}

#[test]
fn model_reseeded() -> chain_table::Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut table = HashTable::new()?;

    for round in 0..5 {
        run_model(round, 1_000, 200, &mut table)?;
        table.set_seed(rng.random());
        table.clear();
    }

    Ok(())
}
