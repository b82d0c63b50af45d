//! Property-based tests for the remapping engine
//!
//! These tests check invariants that should hold for any input the
//! strategies below can produce.

use proptest::prelude::*;
use remap_core::{parse_key, transform, FunctionTable, KeyToken};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// Strategy functions for property testing

/// Plain field names: never digits-only, never containing keymap syntax
fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,10}"
}

/// Leaf values of any scalar kind
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ]
}

/// A flat input object
fn flat_object_strategy() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map(field_name_strategy(), scalar_strategy(), 0..8)
}

/// Raw destination strings built from the characters the parser cares about
fn key_path_strategy() -> impl Strategy<Value = String> {
    "[a-c0-9.%]{0,24}"
}

fn to_object(fields: &BTreeMap<String, Value>) -> Value {
    Value::Object(fields.clone().into_iter().collect::<Map<String, Value>>())
}

proptest! {
    #[test]
    fn prop_identity_keymap_reproduces_input(fields in flat_object_strategy()) {
        let keymap = Value::Object(
            fields
                .keys()
                .map(|key| (key.clone(), Value::String(key.clone())))
                .collect(),
        );
        let input = to_object(&fields);

        let output = transform(&keymap, &input, &FunctionTable::new()).unwrap();
        prop_assert_eq!(output, input);
    }

    #[test]
    fn prop_prefixing_moves_every_field(fields in flat_object_strategy()) {
        let keymap = Value::Object(
            fields
                .keys()
                .map(|key| (key.clone(), Value::String(format!("moved.{}", key))))
                .collect(),
        );
        let input = to_object(&fields);

        let output = transform(&keymap, &input, &FunctionTable::new()).unwrap();
        if fields.is_empty() {
            prop_assert_eq!(output, Value::Object(Map::new()));
        } else {
            prop_assert_eq!(&output["moved"], &input);
        }
    }

    #[test]
    fn prop_sequence_identity(items in prop::collection::vec(scalar_strategy(), 0..20)) {
        let keymap = serde_json::json!(["%"]);
        let input = Value::Array(items);

        let output = transform(&keymap, &input, &FunctionTable::new()).unwrap();
        prop_assert_eq!(output, input);
    }

    #[test]
    fn prop_transform_is_deterministic(fields in flat_object_strategy()) {
        let keymap = serde_json::json!({"/^(.)(.*)$/": "$2$1"});
        let input = to_object(&fields);

        let first = transform(&keymap, &input, &FunctionTable::new()).map_err(|e| e.kind());
        let second = transform(&keymap, &input, &FunctionTable::new()).map_err(|e| e.kind());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_parse_key_elevators_form_a_prefix(path in key_path_strategy()) {
        let tokens = parse_key(&path);
        let leading = tokens.iter().take_while(|token| token.is_elevator()).count();
        prop_assert!(tokens[leading..].iter().all(|token| !token.is_elevator()));
    }

    #[test]
    fn prop_parse_key_segments_are_never_empty(path in key_path_strategy()) {
        for token in parse_key(&path) {
            if let KeyToken::Key(segment) = token {
                prop_assert!(!segment.is_empty());
                prop_assert!(!segment.contains('.'));
            }
        }
    }

    #[test]
    fn prop_parse_key_accepts_any_text(path in "\\PC{0,32}") {
        let _ = parse_key(&path);
    }
}
