//! Property tests for the submitter annotation parser.

use gleaner_harvest::annotations::{submitters, SUBMITTER_PREFIX};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

proptest! {
    #[test]
    fn every_annotated_identifier_comes_back_once_in_index_order(
        indices in proptest::collection::btree_set(0u32..1000, 0..12),
        with_names in any::<bool>(),
        noise in proptest::collection::vec("[a-z.]{1,20}", 0..6),
    ) {
        let mut annotations = BTreeMap::new();
        for index in &indices {
            annotations.insert(
                format!("{SUBMITTER_PREFIX}identifier.{index}"),
                format!("https://orcid.org/{index}"),
            );
            if with_names {
                annotations.insert(
                    format!("{SUBMITTER_PREFIX}name.{index}"),
                    format!("Person {index}"),
                );
            }
        }
        for (i, key) in noise.iter().enumerate() {
            // unrelated keys never produce submitters
            annotations.entry(format!("noise.{key}.{i}")).or_insert_with(|| "x".to_string());
        }

        let decoded = submitters(&annotations);
        let decoded_indices: Vec<u32> = decoded.iter().map(|s| s.index).collect();
        let expected: Vec<u32> = indices.iter().copied().collect();
        prop_assert_eq!(decoded_indices, expected);

        let unique: BTreeSet<&str> =
            decoded.iter().map(|s| s.identifier.as_str()).collect();
        prop_assert_eq!(unique.len(), decoded.len());
        for submitter in &decoded {
            prop_assert_eq!(submitter.name.is_some(), with_names);
        }
    }
}
