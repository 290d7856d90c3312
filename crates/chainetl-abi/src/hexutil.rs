//! Hex string primitives shared by the signature and decode layers.
//!
//! The `0x` prefix is accepted case-insensitively on every input and never
//! emitted by these functions; callers add it back where the wire format
//! demands one.

use crate::error::HexError;
use alloy_primitives::U256;

/// Strip a leading `0x`/`0X` if present.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string into bytes. Odd-length input is left-padded with a
/// single `0`, so `"f"` decodes to `0x0f`.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, HexError> {
    let s = strip_hex_prefix(s);
    let decoded = if s.len() % 2 == 1 {
        let mut padded = String::with_capacity(s.len() + 1);
        padded.push('0');
        padded.push_str(s);
        hex::decode(&padded)
    } else {
        hex::decode(s)
    };
    decoded.map_err(|_| HexError::InvalidHex {
        input: s.to_string(),
    })
}

/// Encode bytes as lowercase hex, no prefix.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Left-pad with zeros to `n_bytes` worth of hex chars. Pass-through when
/// the input is already at least that long.
pub fn pad_left(s: &str, n_bytes: usize) -> String {
    let want = n_bytes * 2;
    if s.len() >= want {
        return s.to_string();
    }
    let mut out = String::with_capacity(want);
    out.extend(std::iter::repeat('0').take(want - s.len()));
    out.push_str(s);
    out
}

/// Right-pad with zeros to `n_bytes` worth of hex chars.
pub fn pad_right(s: &str, n_bytes: usize) -> String {
    let want = n_bytes * 2;
    if s.len() >= want {
        return s.to_string();
    }
    let mut out = String::with_capacity(want);
    out.push_str(s);
    out.extend(std::iter::repeat('0').take(want - s.len()));
    out
}

/// Convert a big-endian hex string into an unsigned base-10 string.
///
/// Empty and all-zero inputs yield `"0"`. Values wider than 256 bits are
/// rejected rather than silently truncated.
pub fn hex_to_decimal(s: &str) -> Result<String, HexError> {
    let s = strip_hex_prefix(s);
    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidHex {
            input: s.to_string(),
        });
    }
    let trimmed = s.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok("0".to_string());
    }
    if trimmed.len() > 64 {
        return Err(HexError::Overflow {
            input: s.to_string(),
        });
    }
    let value = U256::from_str_radix(trimmed, 16).map_err(|_| HexError::InvalidHex {
        input: s.to_string(),
    })?;
    Ok(value.to_string())
}

/// Returns `true` for a non-empty string of hex digits (prefix optional).
pub fn is_valid_hex(s: &str) -> bool {
    let s = strip_hex_prefix(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}
