// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Non-error outcomes and their stable numeric codes
//!
//! Misses on lookup and deletion are expressed as `Option::None`,
//! so only the outcomes of a successful insertion live here.

/// Code of a lookup or deletion that found nothing
pub const NOTHING_FOUND: i32 = 1;

/// Outcome of a successful mutating operation
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum Status {
    /// Everything worked as intended
    Ok,

    /// The key already existed and its value was replaced in place
    UpdatedExisting,

    /// The operation completed, but the bucket array could not be
    /// resized and the table keeps working at its old size
    CapacityDegraded,
}

impl Status {
    /// Returns `true` if the entry count grew.
    #[must_use]
    pub fn is_new_entry(self) -> bool {
        self != Self::UpdatedExisting
    }

    /// Numeric status code, see [`describe`].
    #[must_use]
    pub fn code(self) -> i32 {
        i32::from(self)
    }
}

impl From<Status> for i32 {
    fn from(value: Status) -> Self {
        match value {
            Status::Ok => 0,
            Status::UpdatedExisting => 2,
            Status::CapacityDegraded => -6,
        }
    }
}

impl TryFrom<i32> for Status {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ok),
            2 => Ok(Self::UpdatedExisting),
            -6 => Ok(Self::CapacityDegraded),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(describe(self.code()).trim_end())
    }
}

/// Returns a human readable sentence for a numeric status code.
///
/// Codes are stable: `0` is success, positive values are expected
/// non-error outcomes and negative values are errors.
#[must_use]
pub fn describe(code: i32) -> &'static str {
    match code {
        -1 => "hashTable Error: First parameter provided is invalid.\n",
        -2 => "hashTable Error: Second parameter provided is invalid.\n",
        -3 => "hashTable Error: Third parameter provided is invalid (zero length key).\n",
        -4 => "hashTable Error: Forth parameter provided is invalid.\n",
        -5 => "hashTable Error: Memory allocation was refused.\n",
        -6 => concat!(
            "hashTable Error: Cannot make new table, ",
            "using old table (capacity above 1.0).\n"
        ),
        -7 => "hashTable Error: Key is not an encoded integer.\n",
        0 => "hashTable OK: Everything worked as intended.\n",
        NOTHING_FOUND => concat!(
            "hashTable Status: Nothing Found. ",
            "Search for node terminated with nothing in find or delete.\n"
        ),
        2 => "hashTable Status: Existing key found and value updated.\n",
        _ => "hashTable Default: This value is not enumerated. Debug has no information for you.\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use test_log::test;

    #[test]
    fn status_code_roundtrip() {
        for status in Status::iter() {
            assert_eq!(Ok(status), Status::try_from(status.code()));
        }
        assert_eq!(Err(()), Status::try_from(NOTHING_FOUND));
    }

    #[test]
    fn status_messages_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for status in Status::iter() {
            assert!(seen.insert(status.to_string()), "duplicate message for {status:?}");
            assert!(!status.to_string().contains("not enumerated"));
        }
    }

    #[test]
    fn describe_unknown_code() {
        assert!(describe(42).contains("not enumerated"));
        assert!(describe(-100).contains("not enumerated"));
        assert!(describe(NOTHING_FOUND).contains("Nothing Found"));
    }

    #[test]
    fn only_degraded_is_negative() {
        for status in Status::iter() {
            assert_eq!(status == Status::CapacityDegraded, status.code() < 0);
        }
    }
}
