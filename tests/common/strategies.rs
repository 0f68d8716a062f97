use proptest::prelude::*;
use sandboxberry::constants::SYSTEM_COLUMNS;
use serde_json::Value;

/// Strategy for generating custom and standard field names
pub fn column_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,15}(__c)?"
}

/// Strategy for picking one of the environment-managed columns
pub fn system_column_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(SYSTEM_COLUMNS.to_vec()).prop_map(str::to_string)
}

/// Column lists mixing regular and system columns
pub fn mixed_columns_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            3 => column_name_strategy(),
            1 => system_column_strategy(),
        ],
        0..16,
    )
}

/// Non-empty column lists of regular fields
pub fn columns_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(column_name_strategy(), 1..10)
}

/// Strategy for generating object API names
pub fn object_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,20}(__c)?"
}

/// Optional equality filters
pub fn filter_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Z][A-Za-z]{0,10}__c = '[a-z]{0,8}'")
}

/// Values that count as "no reference"
pub fn blank_value_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        "[ \t]{0,4}".prop_map(|s| Some(Value::String(s))),
    ]
}

/// (object type, source id, destination id) triples with distinct keys
pub fn mapping_strategy() -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::btree_map(
        ("(Account|Contact|Case|Widget__c)", "[0-9A-Za-z]{15}"),
        "[0-9A-Za-z]{18}",
        1..40,
    )
    .prop_map(|entries| {
        let mut seen = std::collections::HashSet::new();
        entries
            .into_iter()
            .filter(|((object_type, source_id), _)| {
                seen.insert((object_type.to_ascii_lowercase(), source_id.clone()))
            })
            .map(|((object_type, source_id), destination_id)| {
                (object_type, source_id, destination_id)
            })
            .collect()
    })
}

/// Acyclic dependency shapes: object `i` may only reference objects `< i`
pub fn acyclic_dependencies_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..8).prop_flat_map(|count| {
        (0..count)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..i, 0..=i.min(3)).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}
