//! JSON helpers for on-disk files.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A document could not be encoded or decoded.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The value could not be encoded.
    #[error("failed to encode JSON: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes are not valid JSON for the expected type.
    #[error("failed to decode JSON at line {line}, column {column}: {source}")]
    Decode {
        /// 1-based line of the error.
        line: usize,
        /// 1-based column of the error.
        column: usize,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Encodes `value` with two-space indentation and a trailing newline.
///
/// # Errors
///
/// Returns [`SerializationError::Encode`] if `value` cannot be represented
/// as JSON.
pub fn to_json_pretty_bytes<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(SerializationError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes a JSON document.
///
/// # Errors
///
/// Returns [`SerializationError::Decode`] with the error position.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(|source| SerializationError::Decode {
        line: source.line(),
        column: source.column(),
        source,
    })
}
