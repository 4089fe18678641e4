use chain_table::{hash::cstr_compare, Config, FnStrategy, Fnv1, HashStrategy, Xxh3};
use std::cmp::Ordering;
use test_log::test;

#[test]
fn custom_hasher_xxh3() -> chain_table::Result<()> {
    let mut table = Config::new().hash_strategy(Xxh3).build()?;

    for n in 0..1_000 {
        table.insert(n.to_string(), n)?;
    }
    for n in 0..1_000 {
        assert_eq!(Some(&n), table.find(n.to_string())?.map(|node| node.value()));
    }

    let node = table.find("123")?.expect("should exist");
    assert_eq!(Xxh3.hash(b"123", table.seed()), node.hash());

    Ok(())
}

#[test]
fn custom_hasher_fnv1_is_add_then_multiply() {
    // single byte: (seed * prime) + byte
    let seed = 3;
    let expected = 3u64.wrapping_mul(0x100_0000_01B3).wrapping_add(u64::from(b'a'));
    assert_eq!(expected, Fnv1.hash(b"a", seed));

    assert_eq!(seed, Fnv1.hash(b"", seed));
}

#[test]
fn custom_hasher_closures() -> chain_table::Result<()> {
    // case insensitive keys
    let strategy = FnStrategy::new(
        |key: &[u8], seed| {
            key.iter()
                .fold(seed, |h, b| Fnv1.hash(&[b.to_ascii_lowercase()], h))
        },
        |a: &[u8], b: &[u8]| {
            if a.eq_ignore_ascii_case(b) {
                Ordering::Equal
            } else {
                cstr_compare(a, b)
            }
        },
    );

    let mut table = Config::new().hash_strategy(strategy).build()?;

    table.insert("Hello", 1)?;
    assert_eq!(Some(&1), table.find("HELLO")?.map(|node| node.value()));

    table.insert("hello", 2)?;
    assert_eq!(1, table.count());
    assert_eq!(b"Hello", table.find("hello")?.expect("should exist").key());

    Ok(())
}

#[test]
fn custom_hasher_constant_hash() -> chain_table::Result<()> {
    let mut table = Config::new()
        .hash_strategy(FnStrategy::new(|_: &[u8], _| 42, cstr_compare))
        .build()?;

    for n in 0..100 {
        table.insert_int(n, n)?;
    }

    assert_eq!(100, table.max_chain_length());

    for n in 0..100 {
        assert_eq!(Some(&n), table.find_int(n).map(|node| node.value()));
    }

    Ok(())
}
