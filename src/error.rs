// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::DecodeError;

/// A caller-side mistake that is rejected before the table is touched
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArgumentError {
    /// Keys need at least one byte
    EmptyKey,

    /// Key is longer than [`crate::MAX_KEY_LEN`]
    KeyTooLong {
        /// Length of the rejected key
        len: usize,
    },

    /// Minimum bucket count is not a non-zero power of two (or is too large)
    MinBuckets(u32),
}

impl std::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "key has zero length"),
            Self::KeyTooLong { len } => write!(
                f,
                "key has {len} bytes, at most {} are allowed",
                crate::MAX_KEY_LEN
            ),
            Self::MinBuckets(n) => {
                write!(f, "minimum bucket count {n} is not a power of two in 1..=2^31")
            }
        }
    }
}

/// Represents errors that can occur in the hash table
#[derive(Debug)]
pub enum Error {
    /// Invalid parameter, the call can be retried after fixing it
    InvalidArgument(ArgumentError),

    /// Memory for a node, a key buffer or the bucket array could not be obtained
    AllocationFailed,

    /// A stored key was expected to be an encoded integer but is not
    Decode(DecodeError),
}

impl Error {
    /// Numeric status code, compatible with [`crate::status::describe`]
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument(ArgumentError::MinBuckets(_)) => -1,
            Self::InvalidArgument(ArgumentError::KeyTooLong { .. }) => -2,
            Self::InvalidArgument(ArgumentError::EmptyKey) => -3,
            Self::AllocationFailed => -5,
            Self::Decode(_) => -7,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(e) => write!(f, "hashTable Error: invalid argument: {e}"),
            Self::AllocationFailed => {
                write!(f, "hashTable Error: memory allocation was refused")
            }
            Self::Decode(e) => write!(f, "hashTable Error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArgumentError> for Error {
    fn from(value: ArgumentError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::AllocationFailed
    }
}

/// Hash table result
pub type Result<T> = std::result::Result<T, Error>;
