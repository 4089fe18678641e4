// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Pluggable hash & comparison strategies
//!
//! A table never hashes or compares keys on its own, it asks its
//! [`HashStrategy`]. Keys are handed over without their NUL terminator;
//! both sides of a comparison always have the same length and the same
//! cached hash, because the table rejects everything else beforehand.

use std::cmp::Ordering;

/// Prime of the 64-bit FNV family
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Offset basis of the 64-bit FNV family, used as the default seed
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// Hash & compare pair used by a table
pub trait HashStrategy {
    /// Hashes a key, mixing in the table's seed.
    fn hash(&self, key: &[u8], seed: u64) -> u64;

    /// Compares two keys of equal length.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Modified FNV-1 with C-string comparison (the default)
///
/// The accumulator starts at the seed, then every byte is *added* to the
/// accumulator times the FNV prime. This differs from FNV-1a on purpose:
/// hashes must stay identical across versions.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Fnv1;

impl HashStrategy for Fnv1 {
    #[inline]
    fn hash(&self, key: &[u8], seed: u64) -> u64 {
        key.iter().fold(seed, |hash, &byte| {
            u64::from(byte).wrapping_add(hash.wrapping_mul(FNV_PRIME))
        })
    }

    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        cstr_compare(a, b)
    }
}

/// XXH3 (64 bit, seeded) with plain byte-wise comparison
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Xxh3;

impl HashStrategy for Xxh3 {
    #[inline]
    fn hash(&self, key: &[u8], seed: u64) -> u64 {
        xxhash_rust::xxh3::xxh3_64_with_seed(key, seed)
    }

    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// Strategy assembled from two plain functions (or closures)
///
/// ```
/// use chain_table::hash::FnStrategy;
/// use chain_table::Config;
///
/// let strategy = FnStrategy::new(
///     |key: &[u8], seed: u64| key.iter().fold(seed, |h, &b| h.rotate_left(5) ^ u64::from(b)),
///     |a: &[u8], b: &[u8]| a.cmp(b),
/// );
///
/// let mut table = Config::new().hash_strategy(strategy).build()?;
/// table.insert(b"abc", 1)?;
/// assert_eq!(1, *table.find(b"abc")?.expect("should exist").value());
/// # Ok::<(), chain_table::Error>(())
/// ```
#[derive(Copy, Clone, Debug)]
pub struct FnStrategy<H, C> {
    hash: H,
    compare: C,
}

impl<H, C> FnStrategy<H, C>
where
    H: Fn(&[u8], u64) -> u64,
    C: Fn(&[u8], &[u8]) -> Ordering,
{
    /// Creates a strategy from a hash function and a comparison function.
    pub fn new(hash: H, compare: C) -> Self {
        Self { hash, compare }
    }
}

impl<H, C> HashStrategy for FnStrategy<H, C>
where
    H: Fn(&[u8], u64) -> u64,
    C: Fn(&[u8], &[u8]) -> Ordering,
{
    fn hash(&self, key: &[u8], seed: u64) -> u64 {
        (self.hash)(key, seed)
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.compare)(a, b)
    }
}

/// Compares like `strcmp` on NUL-terminated strings: stops at the first
/// differing byte, or at a terminator seen in both inputs.
///
/// The end of a slice counts as a terminator.
#[must_use]
pub fn cstr_compare(a: &[u8], b: &[u8]) -> Ordering {
    for (&x, &y) in a.iter().zip(b) {
        match x.cmp(&y) {
            Ordering::Equal if x == 0 => return Ordering::Equal,
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }

    let x = a.get(b.len()).copied().unwrap_or(0);
    let y = b.get(a.len()).copied().unwrap_or(0);
    x.cmp(&y)
}
