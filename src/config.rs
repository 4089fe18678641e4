// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    error::ArgumentError,
    hash::{Fnv1, HashStrategy, FNV_OFFSET_BASIS},
    resize::MAX_BUCKETS,
    HashTable,
};

/// Bucket count of a fresh table, and the floor for shrinking
pub const DEFAULT_MIN_BUCKETS: u32 = 8;

/// Table configuration
#[derive(Clone, Debug)]
pub struct Config<H = Fnv1> {
    /// Value mixed into every hash
    pub(crate) seed: u64,

    /// Initial bucket count, the table never shrinks below it
    pub(crate) min_buckets: u32,

    /// Whether deletions may halve the bucket array
    pub(crate) shrink: bool,

    /// Hash & compare pair
    pub(crate) strategy: H,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: FNV_OFFSET_BASIS,
            min_buckets: DEFAULT_MIN_BUCKETS,
            shrink: true,
            strategy: Fnv1,
        }
    }
}

impl Config {
    /// Initializes a new config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: HashStrategy> Config<H> {
    /// Sets the hash seed.
    ///
    /// Defaults to the 64-bit FNV offset basis.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the minimum bucket count.
    ///
    /// Must be a power of two. Larger values avoid resizes
    /// for tables whose size is known up front.
    ///
    /// Default = 8
    #[must_use]
    pub fn min_buckets(mut self, n: u32) -> Self {
        self.min_buckets = n;
        self
    }

    /// Toggles shrinking the bucket array when entries are deleted.
    ///
    /// Default = true
    #[must_use]
    pub fn shrink(mut self, enabled: bool) -> Self {
        self.shrink = enabled;
        self
    }

    /// Replaces the hash & compare strategy.
    #[must_use]
    pub fn hash_strategy<S: HashStrategy>(self, strategy: S) -> Config<S> {
        Config {
            seed: self.seed,
            min_buckets: self.min_buckets,
            shrink: self.shrink,
            strategy,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ArgumentError> {
        if self.min_buckets.is_power_of_two() && self.min_buckets <= MAX_BUCKETS {
            Ok(())
        } else {
            Err(ArgumentError::MinBuckets(self.min_buckets))
        }
    }

    /// Creates an empty table using the config.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the config is invalid, or the
    /// initial bucket array cannot be allocated.
    pub fn build<V>(self) -> crate::Result<HashTable<V, H>> {
        HashTable::with_config(self)
    }
}
