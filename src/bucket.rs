// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::node::{Node, NodeArena, NodeId};

/// Flat array of chain heads
///
/// The size is always a power of two, so a hash is mapped
/// to its bucket by masking instead of a modulo.
pub(crate) struct BucketArray {
    heads: Box<[Option<NodeId>]>,
}

impl BucketArray {
    /// Allocates `size` empty buckets, without aborting on allocation failure.
    pub fn try_new(size: u32) -> crate::Result<Self> {
        debug_assert!(size.is_power_of_two(), "bucket count must be a power of two");

        let size = size as usize;

        let mut heads = Vec::new();
        heads.try_reserve_exact(size)?;
        heads.resize(size, None);

        Ok(Self {
            heads: heads.into_boxed_slice(),
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn size(&self) -> u32 {
        // NOTE: Sizes are created from a u32
        self.heads.len() as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn index_of(&self, hash: u64) -> usize {
        let mask = u64::from(self.size()) - 1;
        (hash & mask) as usize
    }

    pub fn head(&self, idx: usize) -> Option<NodeId> {
        self.heads.get(idx).copied().flatten()
    }

    pub fn head_mut(&mut self, idx: usize) -> Option<&mut Option<NodeId>> {
        self.heads.get_mut(idx)
    }

    pub fn heads(&self) -> impl Iterator<Item = Option<NodeId>> + '_ {
        self.heads.iter().copied()
    }

    pub fn clear(&mut self) {
        self.heads.fill(None);
    }

    /// Walks the chain of a bucket.
    pub fn chain<'a, V>(&self, idx: usize, nodes: &'a NodeArena<V>) -> Chain<'a, V> {
        Chain {
            nodes,
            cursor: self.head(idx),
        }
    }

    /// Pushes a node in front of its bucket's chain.
    pub fn push_front<V>(&mut self, id: NodeId, nodes: &mut NodeArena<V>) {
        if let Some(node) = nodes.get_mut(id) {
            self.link_front(id, node);
        }
    }

    pub fn link_front<V>(&mut self, id: NodeId, node: &mut Node<V>) {
        let idx = self.index_of(node.hash());

        if let Some(head) = self.head_mut(idx) {
            node.next = head.replace(id);
        }
    }
}

/// Iterator over one collision chain, head first
pub(crate) struct Chain<'a, V> {
    nodes: &'a NodeArena<V>,
    cursor: Option<NodeId>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = (NodeId, &'a Node<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.nodes.get(id)?;
        self.cursor = node.next;
        Some((id, node))
    }
}
