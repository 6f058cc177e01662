//! # facetdb codec
//!
//! Deterministic value encoding for facetdb.
//!
//! The engine stores two kinds of serialized data and this crate owns both:
//!
//! - **Binary payloads** ([`to_bytes`] / [`from_bytes`]): CBOR for records,
//!   postings lists, and index registrations.
//! - **Canonical text** ([`to_canonical_text`]): compact JSON used inside
//!   reserved store keys, where index field lists and value tuples must
//!   serialize identically no matter how the caller supplied them.
//!
//! Determinism is a property of the value model, not of encoder tricks:
//! [`Fields`] is a sorted map, and [`Value`] has no float variant and no
//! non-text map keys, so every value has exactly one encoding.
//!
//! ## Example
//!
//! ```
//! use facetdb_codec::{from_bytes, to_bytes, Fields, Value};
//!
//! let mut record = Fields::new();
//! record.insert("city".to_string(), Value::from("Dodoma"));
//!
//! let bytes = to_bytes(&record).unwrap();
//! let decoded: Fields = from_bytes(&bytes).unwrap();
//! assert_eq!(record, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binary;
mod error;
mod text;
mod value;

pub use binary::{from_bytes, to_bytes};
pub use error::{CodecError, CodecResult};
pub use text::to_canonical_text;
pub use value::{Fields, Value};
