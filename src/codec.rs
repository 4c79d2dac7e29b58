//! Transcoding bridge between the merge engine's binary change-log and the
//! representations a relational column may hand back.
//!
//! Decode: raw bytes → as-is; numeric array → packed unsigned bytes; text
//! with the `\x` escape marker → hex, then Base64 (the storage layer
//! hex-encodes an already-Base64-encoded blob, so both layers are undone in
//! that order); any other text → plain Base64.
//!
//! Encode is plain standard Base64, the exact inverse of the plain-Base64
//! decode branch.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};
use crate::types::StoredBinaryValue;

/// Two-character prefix marking hex-of-Base64 text.
pub const HEX_ESCAPE_MARKER: &str = "\\x";

/// Decode a stored column value into change-log bytes.
///
/// Returns `None` for absent or empty payloads — zero bytes of change-log
/// is "no change to apply", not an error. Malformed input is logged and
/// also yields `None`: one bad record must never stall the merge pipeline.
pub fn decode(value: Option<&StoredBinaryValue>) -> Option<Vec<u8>> {
    let value = value?;
    match decode_value(value) {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "discarding undecodable change-log value");
            None
        }
    }
}

/// Encode change-log bytes for persistence as standard Base64 text.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn decode_value(value: &StoredBinaryValue) -> Result<Vec<u8>> {
    match value {
        StoredBinaryValue::Bytes(bytes) => Ok(bytes.clone()),
        StoredBinaryValue::Numbers(numbers) => numbers
            .iter()
            .map(|&n| {
                u8::try_from(n).map_err(|_| Error::Decode(format!("byte out of range: {n}")))
            })
            .collect(),
        StoredBinaryValue::Text(text) => decode_text(text),
    }
}

fn decode_text(text: &str) -> Result<Vec<u8>> {
    if let Some(hex_part) = text.strip_prefix(HEX_ESCAPE_MARKER) {
        // Hex layer first: two characters per raw character code.
        let raw = hex::decode(hex_part).map_err(|e| Error::Decode(format!("bad hex: {e}")))?;
        let base64_text = String::from_utf8(raw)
            .map_err(|e| Error::Decode(format!("hex payload is not text: {e}")))?;
        return STANDARD
            .decode(&base64_text)
            .map_err(|e| Error::Decode(format!("bad Base64 under hex: {e}")));
    }
    STANDARD
        .decode(text)
        .map_err(|e| Error::Decode(format!("bad Base64: {e}")))
}
