//! Canonical text encoding for index-key material.
//!
//! Index names and postings keys are store keys, so they need a compact,
//! deterministic, string-shaped serialization rather than a binary one.
//! Compact JSON fits: arrays keep their order, maps come pre-sorted from
//! the value model, and equal values render identically however the caller
//! assembled them.

use crate::error::{CodecError, CodecResult};
use serde::Serialize;

/// Encodes a value as compact, deterministic JSON.
///
/// # Errors
///
/// Returns `EncodingFailed` if the value cannot be serialized.
pub fn to_canonical_text<T: Serialize>(value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Fields, Value};

    #[test]
    fn field_list_is_stable() {
        let fields = vec!["common".to_string(), "diff".to_string()];
        assert_eq!(to_canonical_text(&fields).unwrap(), r#"["common","diff"]"#);
    }

    #[test]
    fn tuple_text_is_order_of_supplied_values() {
        let tuple = vec![Value::from(1), Value::from(0)];
        assert_eq!(to_canonical_text(&tuple).unwrap(), "[1,0]");
    }

    #[test]
    fn equal_maps_render_identically() {
        let mut first = Fields::new();
        first.insert("b".to_string(), Value::from(2));
        first.insert("a".to_string(), Value::from(1));

        let mut second = Fields::new();
        second.insert("a".to_string(), Value::from(1));
        second.insert("b".to_string(), Value::from(2));

        assert_eq!(
            to_canonical_text(&first).unwrap(),
            to_canonical_text(&second).unwrap()
        );
        assert_eq!(to_canonical_text(&first).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn scalars_render_plainly() {
        assert_eq!(to_canonical_text(&Value::Null).unwrap(), "null");
        assert_eq!(to_canonical_text(&Value::from(true)).unwrap(), "true");
        assert_eq!(to_canonical_text(&Value::from(-7)).unwrap(), "-7");
        assert_eq!(to_canonical_text(&Value::from("x")).unwrap(), r#""x""#);
    }
}
