//! Base64 VLQ
//!
//! Variable-length quantities used by the `mappings` field of a source map.
//! Each value is zig-zag signed and split into 5-bit groups, least significant
//! group first, with bit 6 of every digit marking a continuation.

use thiserror::Error;

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE: u64 = 1 << VLQ_BASE_SHIFT;
const VLQ_BASE_MASK: u64 = VLQ_BASE - 1;
const VLQ_CONTINUATION_BIT: u64 = VLQ_BASE;

const B64_DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VlqError {
    #[error("Invalid base64 digit: {0}")]
    InvalidDigit(char),
    #[error("Expected more digits in base 64 VLQ value.")]
    UnexpectedEnd,
    #[error("Must be between 0 and 63: {0}")]
    DigitOutOfRange(u8),
    #[error("VLQ value does not fit in 64 bits")]
    Overflow,
}

/// Encode an integer in `0..64` as a single base64 digit.
pub fn encode_digit(value: u8) -> Result<char, VlqError> {
    B64_DIGITS
        .get(value as usize)
        .map(|digit| *digit as char)
        .ok_or(VlqError::DigitOutOfRange(value))
}

/// Decode a single base64 digit, `None` for bytes outside the alphabet.
pub fn decode_digit(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

fn to_vlq_signed(value: i64) -> u64 {
    let magnitude = value.unsigned_abs() << 1;
    if value < 0 {
        magnitude | 1
    } else {
        magnitude
    }
}

fn from_vlq_signed(value: u64) -> i64 {
    let shifted = (value >> 1) as i64;
    if value & 1 == 1 {
        -shifted
    } else {
        shifted
    }
}

pub fn encode(value: i64) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

/// Append the VLQ digits of `value` to `out`.
pub fn encode_into(value: i64, out: &mut String) {
    let mut vlq = to_vlq_signed(value);
    loop {
        let mut digit = vlq & VLQ_BASE_MASK;
        vlq >>= VLQ_BASE_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        out.push(B64_DIGITS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decode one value from the start of `input`. Returns the value and the
/// number of bytes consumed.
pub fn decode(input: &str) -> Result<(i64, usize), VlqError> {
    decode_at(input.as_bytes(), 0)
}

/// Decode one value starting at byte `start`, returning the value and the
/// number of bytes it spans.
pub(crate) fn decode_at(bytes: &[u8], start: usize) -> Result<(i64, usize), VlqError> {
    let mut index = start;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(index).ok_or(VlqError::UnexpectedEnd)?;
        let digit = decode_digit(byte).ok_or(VlqError::InvalidDigit(byte as char))? as u64;
        index += 1;

        let continuation = digit & VLQ_CONTINUATION_BIT != 0;
        let bits = digit & VLQ_BASE_MASK;
        let part = bits.checked_shl(shift).ok_or(VlqError::Overflow)?;
        if part >> shift != bits {
            return Err(VlqError::Overflow);
        }
        result = result.checked_add(part).ok_or(VlqError::Overflow)?;
        shift += VLQ_BASE_SHIFT;

        if !continuation {
            break;
        }
    }

    Ok((from_vlq_signed(result), index - start))
}
