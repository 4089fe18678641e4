use chain_table::{Config, FnStrategy, HashStrategy, HashTable};
use test_log::test;

/// Sends every key into bucket 0, so chains are built in insertion order
fn single_chain() -> chain_table::Result<HashTable<u8, impl HashStrategy>> {
    Config::new()
        .shrink(false)
        .hash_strategy(FnStrategy::new(
            |_: &[u8], _| 0,
            |a: &[u8], b: &[u8]| a.cmp(b),
        ))
        .build()
}

fn keys<H: HashStrategy>(table: &HashTable<u8, H>) -> Vec<Vec<u8>> {
    table.iter().map(|node| node.key().to_vec()).collect()
}

#[test]
fn delete_sole_entry() -> chain_table::Result<()> {
    let mut table = single_chain()?;
    table.insert("a", 1)?;

    assert_eq!(Some(1), table.delete("a")?);
    assert!(table.is_empty());
    assert_eq!(0, table.count_by_walk());
    assert_eq!(0, table.max_chain_length());

    Ok(())
}

#[test]
fn delete_head_of_chain() -> chain_table::Result<()> {
    let mut table = single_chain()?;
    table.insert("a", 1)?;
    table.insert("b", 2)?;
    table.insert("c", 3)?;

    assert_eq!(Some(1), table.delete("a")?);
    assert_eq!(vec![b"b".to_vec(), b"c".to_vec()], keys(&table));

    Ok(())
}

#[test]
fn delete_middle_of_chain() -> chain_table::Result<()> {
    let mut table = single_chain()?;
    table.insert("a", 1)?;
    table.insert("b", 2)?;
    table.insert("c", 3)?;

    assert_eq!(Some(2), table.delete("b")?);
    assert_eq!(vec![b"a".to_vec(), b"c".to_vec()], keys(&table));
    assert_eq!(Some(&1), table.find("a")?.map(|node| node.value()));
    assert_eq!(Some(&3), table.find("c")?.map(|node| node.value()));

    Ok(())
}

#[test]
fn delete_tail_of_chain() -> chain_table::Result<()> {
    let mut table = single_chain()?;
    table.insert("a", 1)?;
    table.insert("b", 2)?;
    table.insert("c", 3)?;

    assert_eq!(Some(3), table.delete("c")?);
    assert_eq!(vec![b"a".to_vec(), b"b".to_vec()], keys(&table));

    Ok(())
}

#[test]
fn delete_miss_changes_nothing() -> chain_table::Result<()> {
    let mut table = single_chain()?;
    table.insert("a", 1)?;
    table.insert("b", 2)?;

    assert_eq!(None, table.delete("z")?);
    assert_eq!(None, table.delete("ab")?);
    assert_eq!(2, table.count());
    assert_eq!(vec![b"a".to_vec(), b"b".to_vec()], keys(&table));

    Ok(())
}

#[test]
fn delete_twice() -> chain_table::Result<()> {
    let mut table = HashTable::new()?;
    table.insert("a", "value")?;

    assert_eq!(Some("value"), table.delete("a")?);
    assert_eq!(None, table.delete("a")?);
    assert!(table.find("a")?.is_none());

    Ok(())
}

#[test]
fn delete_then_reinsert() -> chain_table::Result<()> {
    let mut table = single_chain()?;
    for key in ["a", "b", "c", "d"] {
        table.insert(key, 0)?;
    }

    table.delete("b")?;
    table.delete("d")?;
    table.insert("e", 5)?;
    table.insert("b", 2)?;

    assert_eq!(
        vec![b"a".to_vec(), b"c".to_vec(), b"e".to_vec(), b"b".to_vec()],
        keys(&table)
    );
    assert_eq!(4, table.count_by_walk());

    Ok(())
}
