// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Grow & shrink triggers, and the relink that moves nodes
//! into a bucket array of a different size
//!
//! Nodes are never copied during a resize, only their links change.

use crate::bucket::BucketArray;
use crate::node::NodeArena;

/// Largest bucket count a table can reach
pub const MAX_BUCKETS: u32 = 1 << 31;

/// Decision of the resize controller
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Resize {
    /// Nothing to do
    Keep,

    /// Double (or halve) to the contained size
    To(u32),

    /// Growing is needed, but the table is already at [`MAX_BUCKETS`]
    AtLimit,
}

/// Checked before every insert: one more entry must still fit.
pub(crate) fn check_grow(count: u32, size: u32) -> Resize {
    if u64::from(count) < u64::from(size) {
        return Resize::Keep;
    }

    match size.checked_mul(2) {
        Some(new_size) if new_size <= MAX_BUCKETS => Resize::To(new_size),
        _ => Resize::AtLimit,
    }
}

/// Checked after every removal, with the count that remains.
pub(crate) fn check_shrink(count: u32, size: u32, min_size: u32) -> Resize {
    if size <= min_size {
        return Resize::Keep;
    }

    if count >= size / 4 {
        return Resize::Keep;
    }

    Resize::To((size / 2).max(min_size))
}

/// Moves every node of `old` into `new`, chain by chain.
///
/// Each node is pushed in front of its new bucket, so chains keep
/// their members but not necessarily their order.
pub(crate) fn relink<V>(old: &BucketArray, nodes: &mut NodeArena<V>, new: &mut BucketArray) {
    for head in old.heads() {
        let mut cursor = head;

        while let Some(id) = cursor {
            cursor = nodes.get(id).and_then(|node| node.next);
            new.push_front(id, nodes);
        }
    }
}

/// Links every node of the arena into `new`, ignoring all existing links.
///
/// Used after the arena was compacted or every hash changed,
/// when the old chains cannot be walked anymore.
pub(crate) fn rebuild<V>(nodes: &mut NodeArena<V>, new: &mut BucketArray) {
    for (id, node) in nodes.iter_mut() {
        new.link_front(id, node);
    }
}
