//! Schema validator for intercepted writes
//!
//! Inserts are validated as whole documents:
//! - All required fields are present
//! - No undeclared fields exist under a closed schema
//! - Declared fields match their type, recursively
//!
//! Updates are validated per operator entry, through path resolution.
//! Only the fields an update touches are checked; required-field presence
//! is assumed to hold for the document being updated.
//!
//! Validation is fail-fast and never mutates its input.

use std::fmt;

use bson::{Bson, Document};
use tracing::{debug, debug_span, trace, warn};

use super::context::ValidationContext;
use super::errors::{SchemaError, SchemaResult};
use super::matcher;
use super::path::{resolve, Terminal};
use super::registry::SchemaRegistry;
use super::types::{FieldKind, ObjectSchema, ScalarType};
use super::value::type_name;

/// Update operators subject to schema checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    Set,
    SetOnInsert,
    Push,
    Pull,
    AddToSet,
    Rename,
    Unset,
}

impl UpdateOperator {
    /// Recognizes a checked operator. `$setToAdd` and `$addToSet` are the same operator.
    pub fn parse(key: &str) -> Option<Self> {
        let op = match key {
            "$set" => UpdateOperator::Set,
            "$setOnInsert" => UpdateOperator::SetOnInsert,
            "$push" => UpdateOperator::Push,
            "$pull" => UpdateOperator::Pull,
            "$setToAdd" | "$addToSet" => UpdateOperator::AddToSet,
            "$rename" => UpdateOperator::Rename,
            "$unset" => UpdateOperator::Unset,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Set => "$set",
            UpdateOperator::SetOnInsert => "$setOnInsert",
            UpdateOperator::Push => "$push",
            UpdateOperator::Pull => "$pull",
            UpdateOperator::AddToSet => "$setToAdd",
            UpdateOperator::Rename => "$rename",
            UpdateOperator::Unset => "$unset",
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether required fields must be present in a (sub)document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Enforced,
    Relaxed,
}

/// Schema validator that enforces collection schemas on writes.
///
/// Holds no mutable state; any number of calls may run concurrently.
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a new validator backed by the given registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates a full document about to be inserted.
    ///
    /// # Errors
    ///
    /// - `UnknownCollection` if no schema is registered
    /// - `MissingRequiredField` if a required field is absent
    /// - `UnknownField` for an undeclared field under a closed schema
    /// - `TypeMismatch` for a value of the wrong type
    pub fn validate_insert(
        &self,
        ctx: &ValidationContext,
        database: &str,
        collection: &str,
        document: &Document,
    ) -> SchemaResult<()> {
        let span = debug_span!("validate_insert", request_id = %ctx.request_id, database, collection);
        let _guard = span.enter();

        let result = self
            .registry
            .lookup(database, collection)
            .and_then(|schema| validate_object(schema, document, "", Presence::Enforced));

        observe(ctx, &result);
        result
    }

    /// Validates an update operator document.
    ///
    /// `$setOnInsert` entries are type-checked like `$set` entries whether
    /// or not `upsert` is set; neither adds presence requirements.
    ///
    /// # Errors
    ///
    /// - `UnknownCollection` if no schema is registered
    /// - `UnknownField` if a path names an undeclared field under a closed schema
    /// - `StructuralPath` if a path does not fit the schema shape
    /// - `TypeMismatch` for an operand of the wrong type
    /// - `ProtectedFieldRemoval` if `$unset`/`$rename` targets a required field
    pub fn validate_update(
        &self,
        ctx: &ValidationContext,
        database: &str,
        collection: &str,
        update: &Document,
        upsert: bool,
    ) -> SchemaResult<()> {
        let span = debug_span!("validate_update", request_id = %ctx.request_id, database, collection, upsert);
        let _guard = span.enter();

        let result = self
            .registry
            .lookup(database, collection)
            .and_then(|schema| validate_operators(schema, update));

        observe(ctx, &result);
        result
    }
}

fn observe(ctx: &ValidationContext, result: &SchemaResult<()>) {
    if let Err(err) = result {
        debug!(code = err.code().code(), error = %err, "write rejected");
    }
    if ctx.is_expired() {
        warn!(elapsed_us = ctx.elapsed_us() as u64, "validation finished past the caller's deadline");
    }
}

/// Validates an object against its schema, recursively.
fn validate_object(
    schema: &ObjectSchema,
    document: &Document,
    path_prefix: &str,
    presence: Presence,
) -> SchemaResult<()> {
    if presence == Presence::Enforced {
        if let Some(missing) = schema.required().find(|name| !document.contains_key(name)) {
            return Err(SchemaError::missing_field(make_path(path_prefix, missing)));
        }
    }

    if schema.is_closed() {
        if let Some(extra) = document.keys().find(|key| schema.field(key).is_none()) {
            return Err(SchemaError::unknown_field(make_path(path_prefix, extra)));
        }
    }

    for (key, value) in document.iter() {
        // Undeclared keys under an open schema are passed through unchecked
        if let Some(field) = schema.field(key) {
            validate_value(field.kind(), value, &make_path(path_prefix, key), presence)?;
        }
    }

    Ok(())
}

/// Validates a value against a declared field kind.
fn validate_value(
    kind: &FieldKind,
    value: &Bson,
    field_path: &str,
    presence: Presence,
) -> SchemaResult<()> {
    match kind {
        FieldKind::Scalar(scalar) => check_scalar(*scalar, value, field_path),
        FieldKind::Object(schema) => {
            let doc = value
                .as_document()
                .ok_or_else(|| type_error(field_path, "object", value))?;
            validate_object(schema, doc, field_path, presence)
        }
        FieldKind::ArrayOfScalar(element) => {
            let items = value
                .as_array()
                .ok_or_else(|| type_error(field_path, kind.type_name(), value))?;
            match matcher::first_mismatch(*element, items) {
                Some(i) => Err(type_error(&make_path(field_path, &i.to_string()), element.type_name(), &items[i])),
                None => Ok(()),
            }
        }
        FieldKind::ArrayOfObject(schema) => {
            let items = value
                .as_array()
                .ok_or_else(|| type_error(field_path, kind.type_name(), value))?;
            for (i, item) in items.iter().enumerate() {
                let elem_path = make_path(field_path, &i.to_string());
                let doc = item
                    .as_document()
                    .ok_or_else(|| type_error(&elem_path, "object", item))?;
                validate_object(schema, doc, &elem_path, presence)?;
            }
            Ok(())
        }
    }
}

fn check_scalar(scalar: ScalarType, value: &Bson, field_path: &str) -> SchemaResult<()> {
    if matcher::matches(scalar, value) {
        Ok(())
    } else {
        Err(type_error(field_path, scalar.type_name(), value))
    }
}

fn validate_operators(schema: &ObjectSchema, update: &Document) -> SchemaResult<()> {
    for (key, entries) in update.iter() {
        let Some(op) = UpdateOperator::parse(key) else {
            trace!(key = key.as_str(), "update key not subject to schema checks");
            continue;
        };

        let entries = entries.as_document().ok_or_else(|| {
            SchemaError::structural(key, format!("{} expects a document of paths", op))
        })?;

        for (path, operand) in entries.iter() {
            validate_entry(schema, op, path, operand)?;
        }
    }

    Ok(())
}

/// Checks one `path: operand` entry of an update operator.
fn validate_entry(root: &ObjectSchema, op: UpdateOperator, path: &str, operand: &Bson) -> SchemaResult<()> {
    let resolution = resolve(root, path)?;

    match op {
        UpdateOperator::Set | UpdateOperator::SetOnInsert => check_assignment(resolution.terminal, operand, path),
        UpdateOperator::Push | UpdateOperator::AddToSet => {
            for element in appended_elements(operand, path)? {
                check_element(resolution.terminal, element, path)?;
            }
            Ok(())
        }
        UpdateOperator::Pull => check_pull(resolution.terminal, operand, path),
        UpdateOperator::Rename => {
            if resolution.touches_required {
                return Err(SchemaError::protected_removal(op.as_str(), path));
            }
            // The destination is not checked against the schema
            if operand.as_str().is_none() {
                return Err(SchemaError::structural(path, "$rename destination must be a string path"));
            }
            Ok(())
        }
        UpdateOperator::Unset => {
            if resolution.touches_required {
                return Err(SchemaError::protected_removal(op.as_str(), path));
            }
            Ok(())
        }
    }
}

/// `$set`-style replacement of whatever the path designates.
fn check_assignment(terminal: Terminal<'_>, value: &Bson, path: &str) -> SchemaResult<()> {
    match terminal {
        Terminal::Scalar(scalar) => check_scalar(scalar, value, path),
        Terminal::Array(field) => validate_value(field.kind(), value, path, Presence::Relaxed),
        Terminal::Object(schema) => {
            let doc = value
                .as_document()
                .ok_or_else(|| type_error(path, "object", value))?;
            validate_object(schema, doc, path, Presence::Relaxed)
        }
        Terminal::Unconstrained => Ok(()),
    }
}

/// A value added to the array at `path`, or assigned when the path is not an array.
fn check_element(terminal: Terminal<'_>, value: &Bson, path: &str) -> SchemaResult<()> {
    match terminal {
        Terminal::Array(field) => match field.kind() {
            FieldKind::ArrayOfScalar(element) => check_scalar(*element, value, path),
            FieldKind::ArrayOfObject(schema) => {
                let doc = value
                    .as_document()
                    .ok_or_else(|| type_error(path, "object", value))?;
                validate_object(schema, doc, path, Presence::Relaxed)
            }
            FieldKind::Scalar(_) | FieldKind::Object(_) => check_assignment(terminal, value, path),
        },
        _ => check_assignment(terminal, value, path),
    }
}

/// `$pull` operands are matched against scalar targets only. Condition
/// documents and object-shaped targets are left to the backing store.
fn check_pull(terminal: Terminal<'_>, operand: &Bson, path: &str) -> SchemaResult<()> {
    if is_condition(operand) {
        return Ok(());
    }
    match terminal {
        Terminal::Scalar(scalar) => check_scalar(scalar, operand, path),
        Terminal::Array(field) => match field.kind() {
            FieldKind::ArrayOfScalar(element) => check_scalar(*element, operand, path),
            _ => Ok(()),
        },
        Terminal::Object(_) | Terminal::Unconstrained => Ok(()),
    }
}

/// Unwraps a `$each` modifier into its elements.
fn appended_elements<'v>(operand: &'v Bson, path: &str) -> SchemaResult<Vec<&'v Bson>> {
    match operand.as_document().and_then(|doc| doc.get("$each")) {
        Some(each) => each
            .as_array()
            .map(|items| items.iter().collect())
            .ok_or_else(|| SchemaError::structural(path, "$each expects an array")),
        None => Ok(vec![operand]),
    }
}

/// A non-empty document made only of `$`-operators, such as `{ $in: [...] }`
fn is_condition(operand: &Bson) -> bool {
    operand
        .as_document()
        .map_or(false, |doc| !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')))
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Creates a type mismatch error.
fn type_error(field_path: &str, expected: impl Into<String>, actual: &Bson) -> SchemaError {
    SchemaError::type_mismatch(field_path, expected, type_name(actual))
}
