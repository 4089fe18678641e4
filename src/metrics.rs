// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Resize counters of a table
///
/// The table is single-threaded, so these are plain counters.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Metrics {
    /// Number of times the bucket array was doubled
    pub(crate) grows: usize,

    /// Number of times the bucket array was halved
    pub(crate) shrinks: usize,

    /// Number of resizes aborted because the new array could not be allocated
    pub(crate) resize_failures: usize,

    /// Number of full rehashes caused by a seed change
    pub(crate) rehashes: usize,
}

impl Metrics {
    /// Number of times the bucket array was doubled.
    #[must_use]
    pub fn grows(&self) -> usize {
        self.grows
    }

    /// Number of times the bucket array was halved.
    #[must_use]
    pub fn shrinks(&self) -> usize {
        self.shrinks
    }

    /// Number of resizes that had to be aborted.
    #[must_use]
    pub fn resize_failures(&self) -> usize {
        self.resize_failures
    }

    /// Number of rehashes caused by a seed change.
    #[must_use]
    pub fn rehashes(&self) -> usize {
        self.rehashes
    }

    /// Share of resizes that succeeded (0.0 - 1.0).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn resize_success_rate(&self) -> f64 {
        let ok = (self.grows + self.shrinks) as f64;
        let total = ok + self.resize_failures as f64;

        if total == 0.0 {
            1.0
        } else {
            ok / total
        }
    }
}
