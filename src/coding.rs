// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Integer key codec
//!
//! Turns an `i64` into a short byte string that contains no zero byte,
//! so it can double as a C string, and back.
//!
//! ```text
//! [header] [digit]+ [0x00]
//!
//! header = (bit length of the low 63 bits + 1) | 0x80 if the sign bit is clear
//! digit  = base-128 digit + 1 (1..=128), most significant first
//! ```
//!
//! The layout is stable, encoded keys may be persisted.

const SIGN_MASK: u64 = 0x8000_0000_0000_0000;
const UNSIGN_MASK: u64 = 0x7FFF_FFFF_FFFF_FFFF;
const POSITIVE_FLAG: u8 = 0x80;
const RADIX: u64 = 128;

/// Maximum number of digit bytes (63 bits in 7 bit groups)
pub const MAX_DIGITS: usize = 9;

/// Maximum encoded length, header included, terminator excluded
pub const MAX_ENCODED_LEN: usize = MAX_DIGITS + 1;

/// Error during deserialization
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// No header byte
    Empty,

    /// Header without any digit
    Truncated,

    /// Header does not match the digits that follow it
    InvalidHeader(u8),

    /// Digit byte outside of `1..=128`
    InvalidDigit(u8),

    /// More digits than an `i64` can have
    Overflow,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecodeError({self:?})")
    }
}

impl std::error::Error for DecodeError {}

/// An encoded integer key, stored inline with its NUL terminator
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct IntKey {
    buf: [u8; MAX_ENCODED_LEN + 1],
    len: u8,
    value: i64,
}

impl IntKey {
    /// Encodes `n`.
    #[must_use]
    pub fn new(n: i64) -> Self {
        encode_i64(n)
    }

    /// Encoded bytes, without terminator.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }

    /// Encoded bytes, including the terminator.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..=usize::from(self.len)]
    }

    /// The integer this key was encoded from.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.value
    }
}

impl std::ops::Deref for IntKey {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for IntKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<i64> for IntKey {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

/// Encodes a signed integer into a NUL-free key.
#[must_use]
#[allow(clippy::indexing_slicing)]
pub fn encode_i64(n: i64) -> IntKey {
    #[allow(clippy::cast_sign_loss)]
    let raw = n as u64;

    let positive = raw & SIGN_MASK == 0;
    let mut magnitude = raw & UNSIGN_MASK;

    // bit length is at most 63, so the header stays below 0x80
    #[allow(clippy::cast_possible_truncation)]
    let bits = (u64::BITS - magnitude.leading_zeros()) as u8;
    let header = (bits + 1) | if positive { POSITIVE_FLAG } else { 0 };

    let mut digits = [0u8; MAX_DIGITS];
    let mut count = 0;

    loop {
        #[allow(clippy::cast_possible_truncation)]
        let digit = (magnitude % RADIX) as u8;
        magnitude /= RADIX;

        digits[count] = digit + 1;
        count += 1;

        if magnitude == 0 {
            break;
        }
    }

    let mut buf = [0; MAX_ENCODED_LEN + 1];
    buf[0] = header;

    for (dst, src) in buf[1..=count].iter_mut().zip(digits[..count].iter().rev()) {
        *dst = *src;
    }

    #[allow(clippy::cast_possible_truncation)]
    let len = (count + 1) as u8;

    IntKey { buf, len, value: n }
}

/// Decodes a key produced by [`encode_i64`].
///
/// Decoding stops at the first zero byte, so keys may be passed
/// with or without their terminator.
///
/// # Errors
///
/// Returns an error if the bytes are not a canonical encoding.
pub fn decode_i64(bytes: &[u8]) -> Result<i64, DecodeError> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = bytes.get(..end).unwrap_or_default();

    let (&header, digits) = bytes.split_first().ok_or(DecodeError::Empty)?;

    if digits.is_empty() {
        return Err(DecodeError::Truncated);
    }
    if digits.len() > MAX_DIGITS {
        return Err(DecodeError::Overflow);
    }

    let mut value: u64 = 0;

    for &byte in digits {
        if !(1..=128).contains(&byte) {
            return Err(DecodeError::InvalidDigit(byte));
        }
        value = value * RADIX + u64::from(byte - 1);
    }

    #[allow(clippy::cast_possible_truncation)]
    let bits = (u64::BITS - value.leading_zeros()) as u8;
    if header & !POSITIVE_FLAG != bits + 1 {
        return Err(DecodeError::InvalidHeader(header));
    }

    // leading zero digits would give a second encoding of the same value
    if digits.len() != usize::from(bits).div_ceil(7).max(1) {
        return Err(DecodeError::InvalidHeader(header));
    }

    let sign = if header & POSITIVE_FLAG == 0 { SIGN_MASK } else { 0 };

    #[allow(clippy::cast_possible_wrap)]
    Ok((value | sign) as i64)
}
