//! Property tests driving the engine with generated datasets.

use facetdb_core::{EngineError, Fields, IndexOptions};
use facetdb_store::KvStore;
use facetdb_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Brute-force reference for `find`: every record whose fields include
/// the whole query, matching value for value.
fn scan_matches(
    dataset: &[(String, Fields)],
    query: &Fields,
) -> BTreeMap<String, Fields> {
    dataset
        .iter()
        .filter(|(_, record)| {
            query
                .iter()
                .all(|(field, value)| record.get(field) == Some(value))
        })
        .map(|(key, record)| (key.clone(), record.clone()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn find_agrees_with_a_full_scan(dataset in arb_dataset(12)) {
        let db = memory_db();
        for (key, record) in &dataset {
            db.put(key, record).unwrap();
        }

        db.create_index("alpha", IndexOptions::new()).unwrap();

        for (_, record) in &dataset {
            let Some(value) = record.get("alpha") else { continue };
            let query = facetdb_testkit::record(&[("alpha", value.clone())]);

            let found = db.find(&query).unwrap();
            prop_assert_eq!(found, scan_matches(&dataset, &query));
        }
    }

    #[test]
    fn reindex_all_changes_nothing_when_postings_are_fresh(dataset in arb_dataset(10)) {
        let (db, store) = memory_db_with_store();
        for (key, record) in &dataset {
            db.put(key, record).unwrap();
        }
        db.create_index("beta", IndexOptions::new()).unwrap();
        db.create_index(vec!["alpha", "gamma"], IndexOptions::new()).unwrap();

        let before = store.scan().unwrap();
        db.reindex_all().unwrap();
        let after = store.scan().unwrap();

        prop_assert_eq!(before, after);
    }

    #[test]
    fn overwrites_never_leave_stale_matches(
        dataset in arb_dataset(8),
        replacement in arb_record(),
    ) {
        let db = memory_db();
        for (key, record) in &dataset {
            db.put(key, record).unwrap();
        }
        db.create_index("alpha", IndexOptions::new()).unwrap();

        let Some((key, old_record)) = dataset.first() else { return Ok(()) };
        db.put(key, &replacement).unwrap();

        // the record's old tuple must no longer surface it
        if let Some(old_value) = old_record.get("alpha") {
            if replacement.get("alpha") != Some(old_value) {
                let query = facetdb_testkit::record(&[("alpha", old_value.clone())]);
                match db.find(&query) {
                    Ok(found) => prop_assert!(!found.contains_key(key)),
                    Err(e) => prop_assert!(e.is_not_found()),
                }
            }
        }
    }

    #[test]
    fn unique_index_creation_matches_duplicate_detection(dataset in arb_dataset(10)) {
        let db = memory_db();
        for (key, record) in &dataset {
            db.put(key, record).unwrap();
        }

        let tuples: Vec<_> = dataset
            .iter()
            .filter_map(|(_, record)| record.get("alpha"))
            .collect();
        let mut deduped = tuples.clone();
        deduped.sort();
        deduped.dedup();
        let has_duplicates = deduped.len() != tuples.len();

        let result = db.create_index("alpha", IndexOptions::new().unique());
        if has_duplicates {
            prop_assert!(
                matches!(result, Err(EngineError::NotUniqueIndexKey { .. })),
                "expected NotUniqueIndexKey error"
            );
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
