// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::decode_i64;
use std::collections::TryReserveError;
use std::ffi::CStr;

/// Index of a node inside the table's node arena
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One stored entry
///
/// The key is an owned copy of the bytes given on insertion,
/// followed by a NUL terminator so it can be handed to C-string consumers.
pub struct Node<V> {
    key: Box<[u8]>,
    value: V,
    hash: u64,
    pub(crate) next: Option<NodeId>,
}

impl<V: std::fmt::Debug> std::fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("key", &String::from_utf8_lossy(self.key()))
            .field("value", &self.value)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .finish_non_exhaustive()
    }
}

impl<V> Node<V> {
    /// Copies the key into an exactly sized buffer.
    pub(crate) fn try_new(key: &[u8], value: V, hash: u64) -> Result<Self, TryReserveError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(key.len() + 1)?;
        buf.extend_from_slice(key);
        buf.push(0);

        Ok(Self {
            key: buf.into_boxed_slice(),
            value,
            hash,
            next: None,
        })
    }

    /// Key bytes, without terminator.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        self.key.get(..self.key_len()).unwrap_or_default()
    }

    /// Key bytes, including the terminator.
    #[must_use]
    pub fn key_with_nul(&self) -> &[u8] {
        &self.key
    }

    /// Key as a C string, `None` if the key contains a zero byte.
    #[must_use]
    pub fn key_as_cstr(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(&self.key).ok()
    }

    /// Decodes the key as an integer key.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::Decode`] if the key was not inserted
    /// through one of the integer-key operations.
    pub fn key_as_int(&self) -> crate::Result<i64> {
        Ok(decode_i64(self.key())?)
    }

    /// Key length in bytes, without terminator.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.key.len() - 1
    }

    /// Returns the stored value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the stored value mutably.
    #[must_use]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Hash computed when the key was inserted (or the seed last changed).
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub(crate) fn set_hash(&mut self, hash: u64) {
        self.hash = hash;
    }

    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }

    pub(crate) fn into_value(self) -> V {
        self.value
    }
}

enum Slot<V> {
    Occupied(Node<V>),
    Vacant { next_free: Option<NodeId> },
}

/// Owns every node of a table
///
/// Vacated slots are chained into a free list and reused by later inserts.
/// The key buffer of a removed node is released immediately, the slot
/// storage once the arena runs empty or is compacted.
pub(crate) struct NodeArena<V> {
    slots: Vec<Slot<V>>,
    free: Option<NodeId>,
    len: u32,
}

impl<V> Default for NodeArena<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            len: 0,
        }
    }
}

impl<V> NodeArena<V> {
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Slots in use, live or vacant.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if fewer than a quarter of the slots hold a node.
    pub fn is_sparse(&self) -> bool {
        (self.len as usize) < self.slots.len() / 4
    }

    /// Heap bytes held by the slots and the key buffers.
    pub fn heap_size(&self) -> usize {
        let slots = self.slots.capacity() * std::mem::size_of::<Slot<V>>();
        let keys = self
            .iter()
            .map(|(_, node)| node.key_with_nul().len())
            .sum::<usize>();

        slots + keys
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<V>> {
        match self.slots.get(id.index())? {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<V>> {
        match self.slots.get_mut(id.index())? {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    /// Stores a node, reusing a vacant slot if there is one.
    pub fn try_insert(&mut self, node: Node<V>) -> crate::Result<NodeId> {
        if let Some(id) = self.free {
            if let Some(slot) = self.slots.get_mut(id.index()) {
                if let Slot::Vacant { next_free } = *slot {
                    self.free = next_free;
                    *slot = Slot::Occupied(node);
                    self.len += 1;
                    return Ok(id);
                }
            }
        }

        let id = u32::try_from(self.slots.len())
            .map(NodeId)
            .map_err(|_| crate::Error::AllocationFailed)?;

        self.slots.try_reserve(1)?;
        self.slots.push(Slot::Occupied(node));
        self.len += 1;

        Ok(id)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node<V>> {
        let slot = self.slots.get_mut(id.index())?;

        if let Slot::Vacant { .. } = slot {
            return None;
        }

        let Slot::Occupied(node) = std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free,
            },
        ) else {
            return None;
        };

        self.free = Some(id);
        self.len -= 1;

        if self.len == 0 {
            self.clear();
        }

        Some(node)
    }

    /// Live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<V>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| match slot {
            #[allow(clippy::cast_possible_truncation)]
            Slot::Occupied(node) => Some((NodeId(idx as u32), node)),
            Slot::Vacant { .. } => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node<V>)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                #[allow(clippy::cast_possible_truncation)]
                Slot::Occupied(node) => Some((NodeId(idx as u32), node)),
                Slot::Vacant { .. } => None,
            })
    }

    /// Moves every live node into a freshly allocated, gap-free slot vector.
    ///
    /// Every [`NodeId`] and every link is invalidated, so the caller has to
    /// relink all nodes afterwards. On allocation failure nothing is touched.
    pub fn try_compact(&mut self) -> crate::Result<()> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(self.len as usize)?;

        for slot in std::mem::take(&mut self.slots) {
            if let Slot::Occupied(mut node) = slot {
                node.next = None;
                slots.push(Slot::Occupied(node));
            }
        }

        self.slots = slots;
        self.free = None;

        Ok(())
    }

    /// Drops every node and releases the slot storage.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.free = None;
        self.len = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn node_key_is_terminated() {
        let node = Node::try_new(b"abc", 1, 7).unwrap();
        assert_eq!(b"abc", node.key());
        assert_eq!(b"abc\0", node.key_with_nul());
        assert_eq!(3, node.key_len());
        assert_eq!(c"abc", node.key_as_cstr().unwrap());
        assert_eq!(7, node.hash());
    }

    #[test]
    fn node_key_with_inner_nul_is_not_a_cstr() {
        let node = Node::try_new(b"a\0b", (), 0).unwrap();
        assert_eq!(None, node.key_as_cstr());
        assert_eq!(b"a\0b", node.key());
    }

    #[test]
    fn node_int_key() {
        let key = crate::coding::encode_i64(-42);
        let node = Node::try_new(&key, (), 0).unwrap();
        assert_eq!(-42, node.key_as_int().unwrap());

        let node = Node::try_new(b"plain", (), 0).unwrap();
        assert!(node.key_as_int().is_err());
    }

    #[test]
    fn arena_reuses_vacant_slots() -> crate::Result<()> {
        let mut arena = NodeArena::default();

        let a = arena.try_insert(Node::try_new(b"a", 1, 0)?)?;
        let b = arena.try_insert(Node::try_new(b"b", 2, 0)?)?;
        assert_eq!(2, arena.len());

        assert_eq!(1, arena.remove(a).unwrap().into_value());
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());
        assert_eq!(1, arena.len());

        let c = arena.try_insert(Node::try_new(b"c", 3, 0)?)?;
        assert_eq!(a, c);
        assert_eq!(2, arena.slot_count());

        assert_eq!(b"b", arena.get(b).unwrap().key());
        assert_eq!(b"c", arena.get(c).unwrap().key());
        assert_eq!(2, arena.iter().count());

        arena.clear();
        assert_eq!(0, arena.len());
        assert_eq!(0, arena.slot_count());
        assert_eq!(0, arena.heap_size());

        Ok(())
    }

    #[test]
    fn arena_releases_slots_when_empty() -> crate::Result<()> {
        let mut arena = NodeArena::default();

        let ids = (0..100u32)
            .map(|n| arena.try_insert(Node::try_new(&n.to_be_bytes(), n, 0)?))
            .collect::<crate::Result<Vec<_>>>()?;
        assert_eq!(100, arena.slot_count());

        for id in ids {
            arena.remove(id);
        }
        assert_eq!(0, arena.len());
        assert_eq!(0, arena.slot_count());
        assert_eq!(0, arena.heap_size());

        // free list was reset with the slots
        let id = arena.try_insert(Node::try_new(b"x", 0, 0)?)?;
        assert_eq!(b"x", arena.get(id).unwrap().key());

        Ok(())
    }

    #[test]
    fn arena_compact_drops_gaps() -> crate::Result<()> {
        let mut arena = NodeArena::default();

        let ids = (0..100u32)
            .map(|n| arena.try_insert(Node::try_new(&n.to_be_bytes(), n, 0)?))
            .collect::<crate::Result<Vec<_>>>()?;

        for id in ids.iter().skip(10) {
            arena.remove(*id);
        }
        assert!(arena.is_sparse());
        let before = arena.heap_size();

        arena.try_compact()?;
        assert_eq!(10, arena.len());
        assert_eq!(10, arena.slot_count());
        assert!(!arena.is_sparse());
        assert!(arena.heap_size() < before);

        let mut values = arena
            .iter()
            .map(|(_, node)| *node.value())
            .collect::<Vec<_>>();
        values.sort_unstable();
        assert_eq!((0..10).collect::<Vec<_>>(), values);
        assert!(arena.iter().all(|(_, node)| node.next.is_none()));

        Ok(())
    }
}
