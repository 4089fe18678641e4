// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    bucket::{BucketArray, Chain},
    coding::encode_i64,
    error::ArgumentError,
    hash::{Fnv1, HashStrategy},
    node::{Node, NodeArena, NodeId},
    resize::{self, Resize},
    Config, Status, MAX_KEY_LEN,
};
use std::{cmp::Ordering, ops::ControlFlow};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

/// Where a key lives, or would live, inside its bucket
#[derive(Copy, Clone, Debug)]
struct Location {
    bucket: usize,

    /// Node before the match, or the chain's tail if there is no match
    prev: Option<NodeId>,

    found: Option<NodeId>,
}

/// A hash table with separate chaining, keyed by byte strings
///
/// Keys are copied into the table on insertion. Integer keys are
/// supported through a reversible encoding, see [`crate::coding`].
///
/// The bucket count is always a power of two: it doubles before an insert
/// would exceed it and (optionally) halves when fewer than a quarter
/// of the buckets would be used after a delete.
pub struct HashTable<V, H = Fnv1> {
    buckets: BucketArray,
    nodes: NodeArena<V>,
    seed: u64,
    min_buckets: u32,
    shrink: bool,

    /// Set while the last resize attempt could not allocate its bucket array
    degraded: bool,

    strategy: H,

    #[cfg(feature = "metrics")]
    metrics: Metrics,

    #[cfg(test)]
    pub(crate) fail_resize: bool,
}

impl<V, H> std::fmt::Debug for HashTable<V, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashTable")
            .field("count", &self.nodes.len())
            .field("size", &self.buckets.size())
            .field("seed", &format_args!("{:#018x}", self.seed))
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with the default config.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the initial bucket array cannot be allocated.
    pub fn new() -> crate::Result<Self> {
        Config::new().build()
    }
}

impl<V, H: HashStrategy> HashTable<V, H> {
    pub(crate) fn with_config(config: Config<H>) -> crate::Result<Self> {
        config.validate()?;

        let buckets = BucketArray::try_new(config.min_buckets)?;

        log::debug!(
            "Creating hash table with {} buckets, shrink={}",
            config.min_buckets,
            config.shrink,
        );

        Ok(Self {
            buckets,
            nodes: NodeArena::default(),
            seed: config.seed,
            min_buckets: config.min_buckets,
            shrink: config.shrink,
            degraded: false,
            strategy: config.strategy,

            #[cfg(feature = "metrics")]
            metrics: Metrics::default(),

            #[cfg(test)]
            fail_resize: false,
        })
    }

    fn check_key(key: &[u8]) -> Result<(), ArgumentError> {
        if key.is_empty() {
            Err(ArgumentError::EmptyKey)
        } else if key.len() > MAX_KEY_LEN {
            Err(ArgumentError::KeyTooLong { len: key.len() })
        } else {
            Ok(())
        }
    }

    fn hash_key(&self, key: &[u8]) -> u64 {
        self.strategy.hash(key, self.seed)
    }

    fn is_match(&self, node: &Node<V>, key: &[u8], hash: u64) -> bool {
        // NOTE: Cheap reject first, the comparator only sees candidates
        node.key_len() == key.len()
            && node.hash() == hash
            && self.strategy.compare(node.key(), key) == Ordering::Equal
    }

    fn locate(&self, key: &[u8], hash: u64) -> Location {
        let bucket = self.buckets.index_of(hash);
        let mut prev = None;

        for (id, node) in self.buckets.chain(bucket, &self.nodes) {
            if self.is_match(node, key, hash) {
                return Location {
                    bucket,
                    prev,
                    found: Some(id),
                };
            }
            prev = Some(id);
        }

        Location {
            bucket,
            prev,
            found: None,
        }
    }

    /// Swaps in a bucket array of `new_size`, returns `false` if it could not be allocated.
    fn resize(&mut self, new_size: u32) -> bool {
        let old_size = self.buckets.size();

        #[cfg(test)]
        let fresh = if self.fail_resize {
            Err(crate::Error::AllocationFailed)
        } else {
            BucketArray::try_new(new_size)
        };

        #[cfg(not(test))]
        let fresh = BucketArray::try_new(new_size);

        match fresh {
            Ok(mut fresh) => {
                // NOTE: Shrinking after mass deletion also hands back the vacant node slots
                if new_size < old_size
                    && self.nodes.is_sparse()
                    && self.nodes.try_compact().is_ok()
                {
                    log::trace!("Compacted node arena to {} slots", self.nodes.slot_count());
                    resize::rebuild(&mut self.nodes, &mut fresh);
                } else {
                    resize::relink(&self.buckets, &mut self.nodes, &mut fresh);
                }
                self.buckets = fresh;
                self.degraded = false;

                log::trace!(
                    "Resized hash table {old_size} -> {new_size} buckets ({} entries)",
                    self.nodes.len(),
                );

                #[cfg(feature = "metrics")]
                if new_size > old_size {
                    self.metrics.grows += 1;
                } else {
                    self.metrics.shrinks += 1;
                }

                true
            }
            Err(e) => {
                log::warn!(
                    "Could not resize hash table {old_size} -> {new_size} buckets, keeping old size: {e}",
                );

                self.degraded = true;

                #[cfg(feature = "metrics")]
                {
                    self.metrics.resize_failures += 1;
                }

                false
            }
        }
    }

    fn grow_if_needed(&mut self) -> Status {
        match resize::check_grow(self.count(), self.buckets.size()) {
            Resize::Keep => Status::Ok,
            Resize::To(new_size) => {
                if self.resize(new_size) {
                    Status::Ok
                } else {
                    Status::CapacityDegraded
                }
            }
            Resize::AtLimit => {
                self.degraded = true;
                Status::CapacityDegraded
            }
        }
    }

    fn shrink_if_needed(&mut self) {
        if !self.shrink {
            return;
        }

        if let Resize::To(new_size) =
            resize::check_shrink(self.count(), self.buckets.size(), self.min_buckets)
        {
            self.resize(new_size);
        }
    }

    fn insert_checked(&mut self, key: &[u8], value: V) -> crate::Result<Status> {
        // NOTE: Grow before walking, so the new node lands in the final array
        let status = self.grow_if_needed();

        let hash = self.hash_key(key);
        let location = self.locate(key, hash);

        if let Some(id) = location.found {
            if let Some(node) = self.nodes.get_mut(id) {
                node.replace_value(value);
            }
            return Ok(Status::UpdatedExisting);
        }

        if self.count() == u32::MAX {
            return Err(crate::Error::AllocationFailed);
        }

        let node = Node::try_new(key, value, hash)?;
        let id = self.nodes.try_insert(node)?;

        // append to the chain
        let link = match location.prev {
            Some(tail) => self.nodes.get_mut(tail).map(|node| &mut node.next),
            None => self.buckets.head_mut(location.bucket),
        };
        if let Some(link) = link {
            *link = Some(id);
        }

        Ok(status)
    }

    fn delete_checked(&mut self, key: &[u8]) -> Option<V> {
        let hash = self.hash_key(key);
        let location = self.locate(key, hash);

        let id = location.found?;
        let node = self.nodes.remove(id)?;

        // sole entry and head of chain relink the bucket,
        // middle and tail relink the predecessor
        let link = match location.prev {
            Some(prev) => self.nodes.get_mut(prev).map(|prev| &mut prev.next),
            None => self.buckets.head_mut(location.bucket),
        };
        if let Some(link) = link {
            *link = node.next;
        }

        self.shrink_if_needed();

        Some(node.into_value())
    }

    /// Inserts a key-value pair.
    ///
    /// If the key already exists, its value is replaced in place.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or too long, or if the node
    /// cannot be allocated. If only the resize fails, the entry is still
    /// inserted and [`Status::CapacityDegraded`] is returned.
    pub fn insert<K: AsRef<[u8]>>(&mut self, key: K, value: V) -> crate::Result<Status> {
        let key = key.as_ref();
        Self::check_key(key)?;
        self.insert_checked(key, value)
    }

    /// Inserts a value under an integer key.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the node cannot be allocated.
    pub fn insert_int(&mut self, key: i64, value: V) -> crate::Result<Status> {
        self.insert_checked(&encode_i64(key), value)
    }

    /// Returns the node of a key.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or too long.
    pub fn find<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<Option<&Node<V>>> {
        let key = key.as_ref();
        Self::check_key(key)?;

        let hash = self.hash_key(key);
        Ok(self
            .locate(key, hash)
            .found
            .and_then(|id| self.nodes.get(id)))
    }

    /// Returns the node of a key mutably.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or too long.
    pub fn find_mut<K: AsRef<[u8]>>(&mut self, key: K) -> crate::Result<Option<&mut Node<V>>> {
        let key = key.as_ref();
        Self::check_key(key)?;

        let hash = self.hash_key(key);
        Ok(self
            .locate(key, hash)
            .found
            .and_then(|id| self.nodes.get_mut(id)))
    }

    /// Returns the node of an integer key.
    #[must_use]
    pub fn find_int(&self, key: i64) -> Option<&Node<V>> {
        let key = encode_i64(key);
        let hash = self.hash_key(&key);
        self.locate(&key, hash)
            .found
            .and_then(|id| self.nodes.get(id))
    }

    /// Returns the node of an integer key mutably.
    pub fn find_int_mut(&mut self, key: i64) -> Option<&mut Node<V>> {
        let key = encode_i64(key);
        let hash = self.hash_key(&key);
        self.locate(&key, hash)
            .found
            .and_then(|id| self.nodes.get_mut(id))
    }

    /// Returns `true` if the table contains the key.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or too long.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<bool> {
        self.find(key).map(|node| node.is_some())
    }

    /// Removes a key, returning its value if it existed.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is empty or too long.
    pub fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> crate::Result<Option<V>> {
        let key = key.as_ref();
        Self::check_key(key)?;
        Ok(self.delete_checked(key))
    }

    /// Removes an integer key, returning its value if it existed.
    pub fn delete_int(&mut self, key: i64) -> Option<V> {
        self.delete_checked(&encode_i64(key))
    }

    /// Returns the hash seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Changes the hash seed, rehashing every entry.
    pub fn set_seed(&mut self, seed: u64) {
        if seed == self.seed {
            return;
        }

        log::debug!(
            "Reseeding hash table with {} entries: {:#x} -> {seed:#x}",
            self.nodes.len(),
            self.seed,
        );

        self.seed = seed;

        for (_, node) in self.nodes.iter_mut() {
            node.set_hash(self.strategy.hash(node.key(), seed));
        }

        self.buckets.clear();
        resize::rebuild(&mut self.nodes, &mut self.buckets);

        #[cfg(feature = "metrics")]
        {
            self.metrics.rehashes += 1;
        }
    }

    /// Number of entries (cached).
    #[must_use]
    pub fn count(&self) -> u32 {
        self.nodes.len()
    }

    /// Number of entries, counted by walking every chain.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn count_by_walk(&self) -> u32 {
        let mut count = 0;
        for idx in 0..self.buckets.size() as usize {
            count += self.chain(idx).count() as u32;
        }
        count
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Current number of buckets, always a power of two.
    #[must_use]
    pub fn bucket_count(&self) -> u32 {
        self.buckets.size()
    }

    /// The bucket count the table starts with and never shrinks below.
    #[must_use]
    pub fn min_buckets(&self) -> u32 {
        self.min_buckets
    }

    /// Returns `true` if deletions may halve the bucket array.
    #[must_use]
    pub fn shrink_enabled(&self) -> bool {
        self.shrink
    }

    /// Returns `true` if the last resize attempt was aborted.
    ///
    /// The table stays fully functional, its chains just get longer.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Length of the longest collision chain.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_chain_length(&self) -> u32 {
        (0..self.buckets.size() as usize)
            .map(|idx| self.chain(idx).count() as u32)
            .max()
            .unwrap_or_default()
    }

    /// Histogram of chain lengths: element `n` is the number of buckets holding `n` entries.
    #[must_use]
    pub fn chain_lengths(&self) -> Vec<u32> {
        let mut histogram = vec![0; self.max_chain_length() as usize + 1];

        for idx in 0..self.buckets.size() as usize {
            if let Some(slot) = histogram.get_mut(self.chain(idx).count()) {
                *slot += 1;
            }
        }

        histogram
    }

    /// Approximate heap usage in bytes.
    #[must_use]
    pub fn approximate_memory(&self) -> usize {
        let buckets = self.buckets.size() as usize * std::mem::size_of::<Option<NodeId>>();
        buckets + self.nodes.heap_size()
    }

    fn chain(&self, idx: usize) -> Chain<'_, V> {
        self.buckets.chain(idx, &self.nodes)
    }

    /// Iterates over all entries, in no particular order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: &self.buckets,
            nodes: &self.nodes,
            next_bucket: 0,
            chain: None,
            remaining: self.nodes.len() as usize,
        }
    }

    /// Calls `visitor` on every entry, in no particular order,
    /// until it returns [`ControlFlow::Break`].
    pub fn traverse<B>(
        &self,
        visitor: impl FnMut(&Node<V>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        self.iter().try_for_each(visitor)
    }

    /// Removes every entry and goes back to the minimum bucket count.
    pub fn clear(&mut self) {
        self.nodes.clear();

        match BucketArray::try_new(self.min_buckets) {
            Ok(buckets) => {
                self.buckets = buckets;
                self.degraded = false;
            }
            Err(_) => self.buckets.clear(),
        }
    }

    /// Releases every node, then the bucket array, then the table itself.
    pub fn free_all(self) {
        let Self { nodes, buckets, .. } = self;

        log::trace!(
            "Freeing hash table with {} entries in {} buckets",
            nodes.len(),
            buckets.size(),
        );

        drop(nodes);
        drop(buckets);
    }

    /// Resize counters.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl<'a, V, H: HashStrategy> IntoIterator for &'a HashTable<V, H> {
    type Item = &'a Node<V>;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`HashTable`], bucket by bucket
pub struct Iter<'a, V> {
    buckets: &'a BucketArray,
    nodes: &'a NodeArena<V>,
    next_bucket: usize,
    chain: Option<Chain<'a, V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Node<V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, node)) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(node);
            }

            if self.next_bucket >= self.buckets.size() as usize {
                return None;
            }

            self.chain = Some(self.buckets.chain(self.next_bucket, self.nodes));
            self.next_bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> std::iter::FusedIterator for Iter<'_, V> {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hash::FnStrategy;
    use test_log::test;

    /// Every key lands in the same bucket, in insertion order
    fn colliding() -> HashTable<u32, impl HashStrategy> {
        Config::new()
            .hash_strategy(FnStrategy::new(|_: &[u8], _| 0, |a: &[u8], b: &[u8]| a.cmp(b)))
            .build()
            .unwrap()
    }

    fn chain_keys<V, H: HashStrategy>(table: &HashTable<V, H>, bucket: usize) -> Vec<Vec<u8>> {
        table
            .chain(bucket)
            .map(|(_, node)| node.key().to_vec())
            .collect()
    }

    #[test]
    fn table_insert_appends_to_chain() -> crate::Result<()> {
        let mut table = colliding();
        for key in ["a", "b", "c"] {
            assert_eq!(Status::Ok, table.insert(key, 0)?);
        }

        assert_eq!(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()], chain_keys(&table, 0));
        assert_eq!(3, table.max_chain_length());

        Ok(())
    }

    #[test]
    fn table_delete_sole_entry() -> crate::Result<()> {
        let mut table = colliding();
        table.insert("a", 1)?;

        assert_eq!(Some(1), table.delete("a")?);
        assert!(chain_keys(&table, 0).is_empty());
        assert_eq!(0, table.count_by_walk());

        Ok(())
    }

    #[test]
    fn table_delete_head_of_chain() -> crate::Result<()> {
        let mut table = colliding();
        for key in ["a", "b", "c"] {
            table.insert(key, 0)?;
        }

        assert_eq!(Some(0), table.delete("a")?);
        assert_eq!(vec![b"b".to_vec(), b"c".to_vec()], chain_keys(&table, 0));

        Ok(())
    }

    #[test]
    fn table_delete_mid_chain() -> crate::Result<()> {
        let mut table = colliding();
        for key in ["a", "b", "c"] {
            table.insert(key, 0)?;
        }

        assert_eq!(Some(0), table.delete("b")?);
        assert_eq!(vec![b"a".to_vec(), b"c".to_vec()], chain_keys(&table, 0));
        assert!(table.contains("a")?);
        assert!(table.contains("c")?);

        Ok(())
    }

    #[test]
    fn table_delete_tail() -> crate::Result<()> {
        let mut table = colliding();
        for key in ["a", "b", "c"] {
            table.insert(key, 0)?;
        }

        assert_eq!(Some(0), table.delete("c")?);
        assert_eq!(vec![b"a".to_vec(), b"b".to_vec()], chain_keys(&table, 0));

        // new entries append behind the new tail
        table.insert("d", 0)?;
        assert_eq!(
            vec![b"a".to_vec(), b"b".to_vec(), b"d".to_vec()],
            chain_keys(&table, 0)
        );

        Ok(())
    }

    #[test]
    fn table_grow_failure_degrades() -> crate::Result<()> {
        let mut table = HashTable::new()?;
        for n in 0..8 {
            assert_eq!(Status::Ok, table.insert_int(n, n)?);
        }
        assert_eq!(8, table.bucket_count());

        table.fail_resize = true;
        assert_eq!(Status::CapacityDegraded, table.insert_int(8, 8)?);
        assert!(table.is_degraded());
        assert_eq!(8, table.bucket_count());
        assert_eq!(9, table.count());

        for n in 0..9 {
            assert_eq!(n, *table.find_int(n).unwrap().value());
        }

        // an update still reports the update
        assert_eq!(Status::UpdatedExisting, table.insert_int(3, 33)?);

        table.fail_resize = false;
        assert_eq!(Status::Ok, table.insert_int(9, 9)?);
        assert!(!table.is_degraded());
        assert_eq!(16, table.bucket_count());

        Ok(())
    }

    #[test]
    fn table_shrink_failure_keeps_size() -> crate::Result<()> {
        let mut table = HashTable::new()?;
        for n in 0..64 {
            table.insert_int(n, ())?;
        }
        let size = table.bucket_count();

        table.fail_resize = true;
        for n in 0..60 {
            assert_eq!(Some(()), table.delete_int(n));
        }
        assert_eq!(size, table.bucket_count());
        assert!(table.is_degraded());

        for n in 60..64 {
            assert!(table.find_int(n).is_some());
        }

        Ok(())
    }

    #[test]
    fn table_chain_lengths_histogram() -> crate::Result<()> {
        let mut table = colliding();
        for key in ["a", "b", "c"] {
            table.insert(key, 0)?;
        }

        let histogram = table.chain_lengths();
        assert_eq!(vec![7, 0, 0, 1], histogram);

        Ok(())
    }
}
