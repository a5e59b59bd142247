//! Base58 text form of snowflake IDs
//!
//! Plain positional notation over the Bitcoin alphabet, most significant
//! digit first, no padding. Zero encodes as `"1"`.

use crate::error::{CoreError, CoreResult};

/// The Bitcoin base58 alphabet
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const INVALID: u8 = u8::MAX;

/// Reverse lookup table: ASCII byte -> digit value
const DECODE_MAP: [u8; 128] = {
    let mut map = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        map[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    map
};

/// Encode a non-negative ID.
///
/// Negative inputs never come out of the generator; they are encoded by
/// their two's-complement bit pattern so the function stays total.
pub fn encode(id: i64) -> String {
    let mut value = id as u64;
    if value == 0 {
        return (ALPHABET[0] as char).to_string();
    }
    let mut digits = Vec::with_capacity(11);
    while value > 0 {
        digits.push(ALPHABET[(value % 58) as usize]);
        value /= 58;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Decode a base58 string back into an ID
pub fn decode(input: &str) -> CoreResult<i64> {
    let invalid = |reason: String| CoreError::InvalidBase58 {
        input: input.to_string(),
        reason,
    };

    if input.is_empty() {
        return Err(invalid("empty input".to_string()));
    }

    let mut value: i64 = 0;
    for ch in input.chars() {
        let digit = u32::from(ch)
            .try_into()
            .ok()
            .and_then(|b: u8| DECODE_MAP.get(usize::from(b)).copied())
            .filter(|d| *d != INVALID)
            .ok_or_else(|| invalid(format!("character '{ch}' is not in the alphabet")))?;
        value = value
            .checked_mul(58)
            .and_then(|v| v.checked_add(i64::from(digit)))
            .ok_or_else(|| invalid("value overflows a 64-bit id".to_string()))?;
    }
    Ok(value)
}

#[cfg(test)]
#[path = "base58_test.rs"]
mod tests;
