//! Update Validation Tests
//!
//! Operator-by-operator validation against the fixture cluster schema:
//! - $set / $push / $pull / $setToAdd / $setOnInsert type-check touched paths
//! - $unset / $rename never remove a required field
//! - Array projections route through element schemas
//! - Required-field presence is never enforced on updates

use mongoproxy_schema::schema::{
    document_from_extended_json, SchemaErrorCode, SchemaLoader, SchemaRegistry, SchemaValidator,
    ValidationContext,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn load_fixture() -> SchemaRegistry {
    SchemaLoader::from_json(include_str!("fixtures/cluster.json")).unwrap()
}

fn update(
    registry: &SchemaRegistry,
    collection: &str,
    input: &serde_json::Value,
    upsert: bool,
) -> Result<(), SchemaErrorCode> {
    let document = document_from_extended_json(input.clone()).unwrap();
    SchemaValidator::new(registry)
        .validate_update(&ValidationContext::new(), "testdb", collection, &document, upsert)
        .map_err(|e| e.code())
}

fn run_cases(cases: Vec<(&str, serde_json::Value, Result<(), SchemaErrorCode>)>, upsert: bool) {
    let registry = load_fixture();
    for (i, (collection, input, expected)) in cases.into_iter().enumerate() {
        let result = update(&registry, collection, &input, upsert);
        assert_eq!(result, expected, "case {} ({}: {})", i, collection, input);
    }
}

use SchemaErrorCode::{
    ProtectedFieldRemoval as Protected, TypeMismatch as Type, UnknownField as Unknown,
};

/// The same shape of cases applies to every value-carrying operator.
fn value_operator_cases(op: &str) -> Vec<(&'static str, serde_json::Value, Result<(), SchemaErrorCode>)> {
    vec![
        // open schema
        ("testcollection", json!({op: {"name": 1}}), Err(Type)),
        ("testcollection", json!({op: {"unknown": 1}}), Ok(())),
        ("testcollection", json!({op: {"name": "name"}}), Ok(())),
        // open schema with a required field
        ("requirea", json!({op: {"a": 1}}), Err(Type)),
        ("requirea", json!({op: {"unknown": 1}}), Ok(())),
        ("requirea", json!({op: {"a": "name"}}), Ok(())),
        ("requirea", json!({op: {"a": "name", "b": 1}}), Ok(())),
        ("requirea", json!({op: {"b": 1}}), Ok(())),
        // closed schema
        ("requireonlya", json!({op: {"a": 1}}), Err(Type)),
        ("requireonlya", json!({op: {"unknown": 1}}), Err(Unknown)),
        ("requireonlya", json!({op: {"a": "name"}}), Ok(())),
        ("requireonlya", json!({op: {"a": "name", "b": 1}}), Err(Unknown)),
        ("requireonlya", json!({op: {"b": 1}}), Err(Unknown)),
        // closed subdocument
        ("requireonlysuba", json!({op: {"doc.a": 1}}), Err(Type)),
        ("requireonlysuba", json!({op: {"doc": {"notrequired": "name"}}}), Ok(())),
        ("requireonlysuba", json!({op: {"doc.unknown": 1}}), Err(Unknown)),
        ("requireonlysuba", json!({op: {"doc.a": "name"}}), Ok(())),
        ("requireonlysuba", json!({op: {"doc": {"a": "name"}}}), Ok(())),
        ("requireonlysuba", json!({op: {"doc.a": "name", "doc.b": 1}}), Err(Unknown)),
        ("requireonlysuba", json!({op: {"a": "name", "doc.b": 1}}), Err(Unknown)),
    ]
}

// =============================================================================
// Value Operator Tests
// =============================================================================

#[test]
fn test_set() {
    run_cases(value_operator_cases("$set"), false);
}

#[test]
fn test_push() {
    run_cases(value_operator_cases("$push"), false);
}

#[test]
fn test_pull() {
    run_cases(value_operator_cases("$pull"), false);
}

#[test]
fn test_set_to_add() {
    run_cases(value_operator_cases("$setToAdd"), false);
}

#[test]
fn test_add_to_set_alias() {
    run_cases(value_operator_cases("$addToSet"), false);
}

/// Setting a closed subdocument still rejects undeclared keys inside it.
#[test]
fn test_set_subdocument_with_unknown_key() {
    run_cases(
        vec![("requireonlysuba", json!({"$set": {"doc": {"a": "name", "b": 1}}}), Err(Unknown))],
        false,
    );
}

// =============================================================================
// Removal Tests
// =============================================================================

#[test]
fn test_rename() {
    run_cases(
        vec![
            ("testcollection", json!({"$rename": {"name": "namenew"}}), Ok(())),
            ("requirea", json!({"$rename": {"a": "b"}}), Err(Protected)),
            ("requirea", json!({"$rename": {"b": "c"}}), Ok(())),
            ("requireonlya", json!({"$rename": {"a": "b"}}), Err(Protected)),
            ("requireonlya", json!({"$rename": {"b": "c"}}), Err(Unknown)),
            ("requireonlysuba", json!({"$rename": {"a": "b"}}), Err(Unknown)),
            ("requireonlysuba", json!({"$rename": {"doc.a": "c"}}), Err(Protected)),
            ("includerequirea", json!({"$rename": {"included.a": "namenew"}}), Err(Protected)),
            ("includerequirea", json!({"$rename": {"included.b": "namenew"}}), Ok(())),
        ],
        false,
    );
}

#[test]
fn test_unset() {
    run_cases(
        vec![
            ("testcollection", json!({"$unset": {"name": 1}}), Ok(())),
            ("testcollection", json!({"$unset": {"unknown": 1}}), Ok(())),
            ("requirea", json!({"$unset": {"a": 1}}), Err(Protected)),
            ("requirea", json!({"$unset": {"unknown": 1}}), Ok(())),
            ("requireonlya", json!({"$unset": {"a": 1}}), Err(Protected)),
            ("requireonlya", json!({"$unset": {"unknown": 1}}), Err(Unknown)),
            ("requireonlysuba", json!({"$unset": {"a": 1}}), Err(Unknown)),
            ("requireonlysuba", json!({"$unset": {"doc.a": 1}}), Err(Protected)),
            ("requireonlysuba", json!({"$unset": {"doc.notrequired": 1}}), Ok(())),
            ("includerequirea", json!({"$unset": {"included.a": 1}}), Err(Protected)),
            ("includerequirea", json!({"$unset": {"included.b": 1}}), Ok(())),
        ],
        false,
    );
}

// =============================================================================
// $setOnInsert Tests
// =============================================================================

#[test]
fn test_set_on_insert() {
    run_cases(
        vec![
            (
                "testcollection",
                json!({
                    "$set": {"age": 1, "friends.0": "linda"},
                    "$setOnInsert": {"name": 1, "friends.0": "alice"}
                }),
                Err(Type),
            ),
            (
                "testcollection",
                json!({
                    "$set": {"age": 1, "friends.0": "linda"},
                    "$setOnInsert": {"name": "a", "friends.0": "linda"}
                }),
                Ok(()),
            ),
            // required fields are not enforced, even on upsert
            ("requirea", json!({"$set": {"b": 1}, "$setOnInsert": {"c": 1}}), Ok(())),
            ("requirea", json!({"$set": {"b": 1}, "$setOnInsert": {"a": "a"}}), Ok(())),
            ("requireonlya", json!({"$set": {"a": 1}, "$setOnInsert": {"a": 1}}), Err(Type)),
            ("requireonlya", json!({"$set": {"a": 1}, "$setOnInsert": {"a": "a"}}), Err(Type)),
            ("requireonlya", json!({"$set": {"a": "b"}, "$setOnInsert": {"a": "a"}}), Ok(())),
            ("includerequirea", json!({"$set": {"included.a": 1}, "$setOnInsert": {"included.a": 1}}), Err(Type)),
            ("includerequirea", json!({"$set": {"included.a": "1"}, "$setOnInsert": {"included.a": "a"}}), Ok(())),
            ("testcollection", json!({"$set": {"friends.0": "linda"}, "$setOnInsert": {"friends.0": 1}}), Err(Type)),
            ("testcollection", json!({"$set": {"friends.0": "linda"}, "$setOnInsert": {"friends.0": "alice"}}), Ok(())),
            ("includerequirea", json!({"$set": {"includedarr.0.a": "linda"}, "$setOnInsert": {"includedarr.0.a": 1}}), Err(Type)),
            ("includerequirea", json!({"$set": {"includedarr.0.a": "linda"}, "$setOnInsert": {"includedarr.0.a": "alice"}}), Ok(())),
        ],
        true,
    );
}

/// `$setOnInsert` is still type-checked when the update is not an upsert.
#[test]
fn test_set_on_insert_without_upsert() {
    run_cases(
        vec![
            ("requireonlya", json!({"$setOnInsert": {"a": 1}}), Err(Type)),
            ("requireonlya", json!({"$setOnInsert": {"a": "a"}}), Ok(())),
        ],
        false,
    );
}

// =============================================================================
// Array Projection Tests
// =============================================================================

const PROJECTIONS: [&str; 5] = ["$", "0", "$[]", "$[foo]", "18446744073709551616"];

#[test]
fn test_set_through_projections() {
    let mut cases = Vec::new();
    for p in PROJECTIONS {
        cases.push(("testcollection", json!({"$set": {format!("friends.{}", p): "linda"}}), Ok(())));
        cases.push(("testcollection", json!({"$set": {format!("friends.{}", p): 1}}), Err(Type)));
        cases.push(("includerequirea", json!({"$set": {format!("includedarr.{}.a", p): "linda"}}), Ok(())));
        cases.push(("includerequirea", json!({"$set": {format!("includedarr.{}.a", p): 5}}), Err(Type)));
    }
    run_cases(cases, false);
}

#[test]
fn test_unset_through_projections() {
    let mut cases = Vec::new();
    for p in PROJECTIONS {
        // friends is required; so is `a` inside each includedarr element
        cases.push(("testcollection", json!({"$unset": {format!("friends.{}", p): "linda"}}), Err(Protected)));
        cases.push(("includerequirea", json!({"$unset": {format!("includedarr.{}.a", p): 1}}), Err(Protected)));
        cases.push(("testcollection", json!({"$unset": {format!("luckynumbers.{}", p): 1}}), Ok(())));
        cases.push(("includerequirea", json!({"$unset": {format!("includedarr.{}.b", p): 1}}), Ok(())));
    }
    run_cases(cases, false);
}

#[test]
fn test_malformed_paths() {
    run_cases(
        vec![
            ("testcollection", json!({"$set": {"name.first": "x"}}), Err(SchemaErrorCode::StructuralPath)),
            ("testcollection", json!({"$set": {"friends.first": "x"}}), Err(SchemaErrorCode::StructuralPath)),
            ("testcollection", json!({"$set": {"friends.0.x": "x"}}), Err(SchemaErrorCode::StructuralPath)),
            ("testcollection", json!({"$set": {"friends..0": "x"}}), Err(SchemaErrorCode::StructuralPath)),
            ("requireonlysuba", json!({"$set": {"doc.$": "x"}}), Err(SchemaErrorCode::StructuralPath)),
        ],
        false,
    );
}
