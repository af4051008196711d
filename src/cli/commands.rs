//! CLI command implementations
//!
//! Each command loads the schema configuration, performs one action and
//! writes a single JSON response. A rejected write is reported on stdout
//! and also returned as an error so the process exits non-zero.

use std::path::Path;

use bson::Document;
use serde_json::json;

use crate::schema::{SchemaError, SchemaLoader, SchemaRegistry, SchemaValidator, ValidationContext};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_error, write_response};

/// Parse arguments and run
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { schema } => check(&schema),
        Command::Insert {
            schema,
            db,
            collection,
        } => {
            let registry = load_registry(&schema)?;
            insert(&registry, &db, &collection, &read_document()?)
        }
        Command::Update {
            schema,
            db,
            collection,
            upsert,
        } => {
            let registry = load_registry(&schema)?;
            update(&registry, &db, &collection, &read_document()?, upsert)
        }
    }
}

fn load_registry(path: &Path) -> CliResult<SchemaRegistry> {
    SchemaLoader::from_path(path).map_err(CliError::from)
}

/// Load a schema configuration and list its collections
pub fn check(schema_path: &Path) -> CliResult<()> {
    let registry = load_registry(schema_path)?;

    let databases: serde_json::Map<String, serde_json::Value> = registry
        .databases()
        .map(|db| (db.to_string(), json!(registry.collections(db).collect::<Vec<_>>())))
        .collect();

    write_response(json!({
        "collections": registry.len(),
        "databases": databases
    }))
}

/// Validate one insert document
pub fn insert(registry: &SchemaRegistry, db: &str, collection: &str, document: &Document) -> CliResult<()> {
    let ctx = ValidationContext::new();
    let result = SchemaValidator::new(registry).validate_insert(&ctx, db, collection, document);
    report(result)
}

/// Validate one update operator document
pub fn update(
    registry: &SchemaRegistry,
    db: &str,
    collection: &str,
    update: &Document,
    upsert: bool,
) -> CliResult<()> {
    let ctx = ValidationContext::new();
    let result = SchemaValidator::new(registry).validate_update(&ctx, db, collection, update, upsert);
    report(result)
}

fn report(result: Result<(), SchemaError>) -> CliResult<()> {
    match result {
        Ok(()) => write_response(json!({ "valid": true })),
        Err(e) => {
            write_error(e.code().code(), &e.to_string())?;
            Err(CliError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::schema::{FieldSchema, ObjectSchema, ScalarType};
    use bson::doc;

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .register(
                "testdb",
                "requireonlya",
                ObjectSchema::closed()
                    .with_field(FieldSchema::required("a", ScalarType::String))
                    .into_shared(),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_insert_accepts_valid_document() {
        assert!(insert(&registry(), "testdb", "requireonlya", &doc! { "a": "x" }).is_ok());
    }

    #[test]
    fn test_rejection_is_an_error() {
        let err = insert(&registry(), "testdb", "requireonlya", &Document::new()).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::Rejected);

        let unset = doc! { "$unset": { "a": "" } };
        let err = update(&registry(), "testdb", "requireonlya", &unset, false).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::Rejected);
    }

    #[test]
    fn test_check_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = check(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::ConfigError);
    }
}
