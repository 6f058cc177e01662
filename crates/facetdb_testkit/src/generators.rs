//! Property-based test generators using proptest.

use facetdb_core::{Fields, Value};
use proptest::prelude::*;

/// Strategy for scalar field values.
pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        // a narrow integer range forces tuple collisions, which is what
        // postings-merging tests want to exercise
        (-4i64..4).prop_map(Value::Integer),
        "[a-c]{1,3}".prop_map(Value::Text),
    ]
}

/// Strategy for arbitrary (possibly nested) field values.
pub fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(2, 16, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            proptest::collection::btree_map("[a-c]{1,3}", inner, 0..3).prop_map(Value::Map),
        ]
    })
}

/// Strategy for field names drawn from a small pool, so generated records
/// frequently overlap on fields.
pub fn arb_field_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("alpha".to_string()),
        Just("beta".to_string()),
        Just("gamma".to_string()),
        Just("delta".to_string()),
    ]
}

/// Strategy for whole records.
pub fn arb_record() -> impl Strategy<Value = Fields> {
    proptest::collection::btree_map(arb_field_name(), arb_scalar(), 1..4)
}

/// Strategy for record keys, kept clear of the reserved `~` namespace.
pub fn arb_record_key() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,7}").expect("valid key regex")
}

/// Strategy for a keyed dataset of records.
pub fn arb_dataset(max: usize) -> impl Strategy<Value = Vec<(String, Fields)>> {
    proptest::collection::btree_map(arb_record_key(), arb_record(), 0..max)
        .prop_map(|entries| entries.into_iter().collect())
}
