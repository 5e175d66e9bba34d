//! Hex encoding for credential blobs.

use thiserror::Error;

/// Characters accepted in a hex-encoded blob.
pub const VALID_HEX_CHARS: &str = "0123456789ABCDEFabcdef";

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error(
        "Illegal character {ch} found in password. Password must be hex encoded including only {valid} characters",
        valid = VALID_HEX_CHARS
    )]
    InvalidChar { ch: char, index: usize },

    #[error("Password must be hex encoded with two characters per byte, got {len} characters")]
    OddLength { len: usize },
}

/// Check that `hex` is a well-formed blob without decoding it.
pub fn validate(hex: &str) -> Result<(), HexError> {
    if let Some((index, ch)) = hex.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidChar { ch, index });
    }
    if hex.len() % 2 != 0 {
        return Err(HexError::OddLength { len: hex.len() });
    }
    Ok(())
}

/// Decode a hex string, most significant nibble first.
pub fn decode(hex: &str) -> Result<Vec<u8>, HexError> {
    validate(hex)?;
    // validated above: every byte is an ASCII hex digit
    Ok(hex
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1]))
        .collect())
}

/// Encode bytes as lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0xf) as usize] as char);
    }
    out
}

fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 0xa,
        b'A'..=b'F' => c - b'A' + 0xa,
        _ => 0,
    }
}
