// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A K.I.S.S. implementation of a hash table with separate chaining.
//!
//! ##### About
//!
//! This crate exports a [`HashTable`] keyed by byte strings, or by `i64` through
//! a reversible, NUL-free encoding (see [`coding`]).
//!
//! Keys are hashed (by default with a seeded FNV-1 variant), masked into a
//! power-of-two bucket array, and resolved inside the bucket's collision chain.
//! The bucket array doubles before an insert would overflow it, and halves again
//! once fewer than a quarter of the buckets are in use.
//!
//! Allocation failures never abort: a failed resize leaves the table fully
//! functional at its old size, a failed node allocation is returned as an error.
//!
//! The table is single-threaded. Wrap it in a lock if it has to be shared.
//!
//! Keys are limited to 65535 bytes and may not be empty.
//!
//! ```
//! use chain_table::{HashTable, Status};
//!
//! let mut table = HashTable::new()?;
//!
//! assert_eq!(Status::Ok, table.insert("hello", 1)?);
//! assert_eq!(Status::UpdatedExisting, table.insert("hello", 2)?);
//! assert_eq!(Some(&2), table.find("hello")?.map(|node| node.value()));
//!
//! table.insert_int(-42, 3)?;
//! assert_eq!(Some(3), table.delete_int(-42));
//!
//! assert_eq!(1, table.count());
//! #
//! # Ok::<(), chain_table::Error>(())
//! ```

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod bucket;

/// Integer key encoding
pub mod coding;

mod config;
mod error;

/// Hash & compare strategies
pub mod hash;

#[cfg(feature = "metrics")]
pub(crate) mod metrics;

mod node;
mod resize;

/// Non-error outcomes and their debug strings
pub mod status;

mod table;

/// Longest accepted key, in bytes (excluding the NUL terminator)
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

pub use {
    coding::{decode_i64, encode_i64, DecodeError, IntKey},
    config::{Config, DEFAULT_MIN_BUCKETS},
    error::{ArgumentError, Error, Result},
    hash::{FnStrategy, Fnv1, HashStrategy, Xxh3},
    node::Node,
    resize::MAX_BUCKETS,
    status::Status,
    table::{HashTable, Iter},
};

#[cfg(feature = "metrics")]
pub use metrics::Metrics;
