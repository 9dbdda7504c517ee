//! Property-based tests for flattening, filtering and merging.
//!
//! Run with: `cargo test --test properties`

use indexmap::IndexMap;
use proptest::prelude::*;

use crucible::{
    exclude, merge, prune, structurize, ContentTree, ExclusionRule, FlatEntrySet, FlatPath,
    FlatValue, PathCodec, PathSegment, RuleSet, Scalar, TreeFlattener,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Keys include delimiters, escapes, digits and the empty string
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_]{1,8}",
        "[0-9]{1,3}",
        "[a-z~/]{0,6}",
        Just(String::new()),
        Just("ID".to_string()),
    ]
}

fn segment_strategy() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        key_strategy().prop_map(PathSegment::Key),
        (0usize..50).prop_map(PathSegment::Index),
    ]
}

fn path_strategy() -> impl Strategy<Value = FlatPath> {
    prop::collection::vec(segment_strategy(), 0..6).prop_map(FlatPath::new)
}

/// Leaf strings never look like JSON documents
fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        Just(Scalar::Null),
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::from),
        "[a-zA-Z0-9 .,!?]{0,12}".prop_map(Scalar::String),
    ]
}

fn value_strategy() -> impl Strategy<Value = FlatValue> {
    prop_oneof![
        4 => scalar_strategy().prop_map(FlatValue::Scalar),
        1 => Just(FlatValue::EmptyList),
        1 => Just(FlatValue::EmptyObject),
    ]
}

/// Trees of any shape, without embedded documents
fn tree_strategy() -> impl Strategy<Value = ContentTree> {
    let leaf = scalar_strategy().prop_map(ContentTree::Leaf);

    leaf.prop_recursive(
        4,  // depth
        64, // max nodes
        6,  // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(ContentTree::List),
                prop::collection::vec((key_strategy(), inner), 0..6).prop_map(|fields| {
                    ContentTree::Object(fields.into_iter().collect::<IndexMap<_, _>>())
                }),
            ]
        },
    )
}

fn entries_strategy() -> impl Strategy<Value = FlatEntrySet> {
    prop::collection::vec(("[a-d]{1,2}(/[a-d0-2]{1,2}){0,2}", value_strategy()), 0..12).prop_map(
        |pairs| {
            pairs
                .into_iter()
                .map(|(key, value)| (PathCodec::decode(&key).unwrap(), value))
                .collect()
        },
    )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_round_trip(tree in tree_strategy()) {
        let entries = TreeFlattener::default().flatten(&tree).unwrap();
        let rebuilt = structurize(&entries).unwrap();
        prop_assert_eq!(rebuilt, tree);
    }

    #[test]
    fn prop_flatten_order_is_deterministic(tree in tree_strategy()) {
        let flattener = TreeFlattener::default();
        let first: Vec<String> = flattener.flatten(&tree).unwrap().paths().map(|p| p.encode()).collect();
        let second: Vec<String> = flattener.flatten(&tree).unwrap().paths().map(|p| p.encode()).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_decode_inverts_encode(path in path_strategy()) {
        let encoded = PathCodec::encode(&path);
        prop_assert_eq!(PathCodec::decode(&encoded).unwrap(), path);
    }

    #[test]
    fn prop_encode_is_injective(a in path_strategy(), b in path_strategy()) {
        if a != b {
            prop_assert_ne!(PathCodec::encode(&a), PathCodec::encode(&b));
        }
    }

    #[test]
    fn prop_decode_never_panics(key in ".{0,24}") {
        let _ = PathCodec::decode(&key);
    }

    #[test]
    fn prop_filter_is_a_subset(entries in entries_strategy(), name in "[a-d]{1,2}") {
        let rules = RuleSet::new()
            .with(ExclusionRule::name(name))
            .with(ExclusionRule::pattern("^c").unwrap());
        let filtered = exclude(&entries, &rules);

        for (path, value) in filtered.iter() {
            prop_assert_eq!(entries.get(path), Some(value));
            let encoded = path.encode();
            prop_assert!(rules.iter().all(|rule| !rule.matches(path, &encoded)));
        }

        let kept: Vec<&FlatPath> = entries.paths().filter(|p| filtered.contains(p)).collect();
        let order: Vec<&FlatPath> = filtered.paths().collect();
        prop_assert_eq!(kept, order);
    }

    #[test]
    fn prop_merge_precedence(base in entries_strategy(), overlay in entries_strategy()) {
        let merged = merge(&base, &overlay);

        for (path, value) in merged.iter() {
            match overlay.get(path) {
                Some(winner) => prop_assert_eq!(value, winner),
                None => prop_assert_eq!(Some(value), base.get(path)),
            }
        }
        prop_assert!(base.paths().all(|p| merged.contains(p)));
        prop_assert!(overlay.paths().all(|p| merged.contains(p)));
    }

    #[test]
    fn prop_prune_removes_only_matches(entries in entries_strategy(), prefix in "[a-d]{1,2}/?") {
        let pruned = prune(&entries, &[prefix.as_str()]);

        let expected: FlatEntrySet = entries
            .iter()
            .filter(|(path, _)| !path.encode().starts_with(&prefix))
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect();
        prop_assert_eq!(pruned, expected);
    }
}
