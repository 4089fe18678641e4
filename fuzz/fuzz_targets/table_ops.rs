#![no_main]
use chain_table::{Config, Status};
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};
use std::collections::HashMap;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert(Vec<u8>, u16),
    InsertInt(i64, u16),
    Find(Vec<u8>),
    FindInt(i64),
    Delete(Vec<u8>),
    DeleteInt(i64),
    SetSeed(u64),
    Clear,
}

#[derive(Arbitrary, Debug)]
struct Input {
    min_buckets_exp: u8,
    shrink: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let min_buckets = 1 << (input.min_buckets_exp % 8);

    let mut table = Config::new()
        .min_buckets(min_buckets)
        .shrink(input.shrink)
        .build()
        .unwrap();

    let mut model = HashMap::<Vec<u8>, u16>::new();

    for op in input.ops {
        match op {
            Op::Insert(key, value) => match table.insert(&key, value) {
                Ok(status) => {
                    let previous = model.insert(key, value);
                    assert_eq!(previous.is_some(), status == Status::UpdatedExisting);
                }
                Err(_) => assert!(key.is_empty() || key.len() > chain_table::MAX_KEY_LEN),
            },
            Op::InsertInt(key, value) => {
                table.insert_int(key, value).unwrap();
                model.insert(chain_table::encode_i64(key).to_vec(), value);
            }
            Op::Find(key) => {
                if let Ok(node) = table.find(&key) {
                    assert_eq!(model.get(&key), node.map(|node| node.value()));
                }
            }
            Op::FindInt(key) => {
                let bytes = chain_table::encode_i64(key).to_vec();
                assert_eq!(
                    model.get(&bytes),
                    table.find_int(key).map(|node| node.value())
                );
            }
            Op::Delete(key) => {
                if let Ok(value) = table.delete(&key) {
                    assert_eq!(model.remove(&key), value);
                }
            }
            Op::DeleteInt(key) => {
                let bytes = chain_table::encode_i64(key).to_vec();
                assert_eq!(model.remove(&bytes), table.delete_int(key));
            }
            Op::SetSeed(seed) => table.set_seed(seed),
            Op::Clear => {
                table.clear();
                model.clear();
            }
        }

        assert_eq!(model.len() as u32, table.count());
        assert!(table.bucket_count().is_power_of_two());
        assert!(table.bucket_count() >= min_buckets);
    }

    assert_eq!(table.count(), table.count_by_walk());
});
