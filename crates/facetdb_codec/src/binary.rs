//! Binary (CBOR) encoding of stored payloads.
//!
//! Every value the engine persists — records, postings lists, index
//! registrations — goes through these two functions. Determinism comes from
//! the value model itself: sorted maps and single-representation primitives
//! mean `ciborium` has exactly one way to write each value.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value to CBOR bytes.
///
/// # Errors
///
/// Returns `EncodingFailed` if the value cannot be serialized.
pub fn to_bytes<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decodes a value from CBOR bytes.
///
/// # Errors
///
/// Returns `DecodingFailed` if the bytes are not valid CBOR for the target
/// type; this includes floats and non-text map keys, which the value model
/// rejects.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}
