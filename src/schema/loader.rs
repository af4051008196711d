//! Schema loader for the cluster schema configuration
//!
//! Configuration layout:
//! - `definitions`: named object schemas, reusable through `"include"`
//! - `databases.<db>.collections.<collection>`: collection root schemas
//!
//! An object schema is `{ "closed": bool, "fields": { <name>: field } }` or
//! `{ "include": "<definition>" }`. A field is
//! `{ "type": "<tag>", "required": bool, "schema": <object schema> }`, where
//! `schema` is only allowed (and then mandatory) for `object` / `[]object`.
//!
//! Every definition is built once and shared by `Arc` wherever it is
//! included. Include cycles, unknown includes, and unknown type tags are
//! malformed configuration.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::errors::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use super::types::{FieldKind, FieldSchema, ObjectSchema, ScalarType};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterConfig {
    #[serde(default)]
    definitions: BTreeMap<String, ObjectSpec>,
    #[serde(default)]
    databases: BTreeMap<String, DatabaseSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSpec {
    #[serde(default)]
    collections: BTreeMap<String, ObjectSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectSpec {
    #[serde(default)]
    include: Option<String>,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSpec {
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    schema: Option<ObjectSpec>,
}

/// Builds a [`SchemaRegistry`] from configuration.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Loads the configuration file at `path`.
    pub fn from_path(path: &Path) -> SchemaResult<SchemaRegistry> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_config(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let config: ClusterConfig = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_config(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        let registry = build_registry(&config)?;
        info!(
            path = %path.display(),
            collections = registry.len(),
            "schema registry loaded"
        );
        Ok(registry)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(content: &str) -> SchemaResult<SchemaRegistry> {
        let config: ClusterConfig = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed_config("<in-memory>", format!("Invalid JSON: {}", e)))?;

        let registry = build_registry(&config)?;
        info!(collections = registry.len(), "schema registry loaded");
        Ok(registry)
    }
}

fn build_registry(config: &ClusterConfig) -> SchemaResult<SchemaRegistry> {
    let mut resolver = DefinitionResolver::new(&config.definitions);

    // Unreferenced definitions are still checked
    for name in config.definitions.keys() {
        resolver.definition(name, "definitions")?;
    }

    let mut builder = SchemaRegistry::builder();
    for (db_name, database) in &config.databases {
        for (coll_name, spec) in &database.collections {
            let location = format!("databases.{}.collections.{}", db_name, coll_name);
            let root = resolver.object(spec, &location)?;
            builder.register(db_name.as_str(), coll_name.as_str(), root)?;
        }
    }

    Ok(builder.build())
}

/// Turns object specs into shared schema nodes, memoizing definitions.
struct DefinitionResolver<'c> {
    specs: &'c BTreeMap<String, ObjectSpec>,
    built: HashMap<String, Arc<ObjectSchema>>,
    /// Definitions currently being built, for cycle detection
    in_progress: Vec<String>,
}

impl<'c> DefinitionResolver<'c> {
    fn new(specs: &'c BTreeMap<String, ObjectSpec>) -> Self {
        Self {
            specs,
            built: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn definition(&mut self, name: &str, location: &str) -> SchemaResult<Arc<ObjectSchema>> {
        if let Some(schema) = self.built.get(name) {
            return Ok(Arc::clone(schema));
        }

        if self.in_progress.iter().any(|n| n == name) {
            let mut chain = self.in_progress.clone();
            chain.push(name.to_string());
            return Err(SchemaError::malformed_config(
                location,
                format!("include cycle: {}", chain.join(" -> ")),
            ));
        }

        let specs = self.specs;
        let spec = specs.get(name).ok_or_else(|| {
            SchemaError::malformed_config(location, format!("unknown definition '{}'", name))
        })?;

        self.in_progress.push(name.to_string());
        let schema = self.object(spec, &format!("definitions.{}", name));
        self.in_progress.pop();

        let schema = schema?;
        self.built.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn object(&mut self, spec: &ObjectSpec, location: &str) -> SchemaResult<Arc<ObjectSchema>> {
        if let Some(name) = &spec.include {
            if !spec.fields.is_empty() || spec.closed {
                return Err(SchemaError::malformed_config(
                    location,
                    "include cannot be combined with fields or closed",
                ));
            }
            return self.definition(name, location);
        }

        let mut schema = ObjectSchema::open().with_closed(spec.closed);
        for (name, field) in &spec.fields {
            let field_location = format!("{}.fields.{}", location, name);
            check_field_name(name, &field_location)?;
            let kind = self.kind(field, &field_location)?;
            schema = schema.with_field(FieldSchema::new(name.as_str(), kind, field.required));
        }

        Ok(schema.into_shared())
    }

    fn kind(&mut self, field: &FieldSpec, location: &str) -> SchemaResult<FieldKind> {
        let (is_array, tag) = match field.type_tag.strip_prefix("[]") {
            Some(element) => (true, element),
            None => (false, field.type_tag.as_str()),
        };

        if tag.eq_ignore_ascii_case("object") {
            let spec = field.schema.as_ref().ok_or_else(|| {
                SchemaError::malformed_config(location, "object fields require a nested schema")
            })?;
            let nested = self.object(spec, &format!("{}.schema", location))?;
            return Ok(if is_array {
                FieldKind::ArrayOfObject(nested)
            } else {
                FieldKind::Object(nested)
            });
        }

        let scalar = ScalarType::parse(tag).ok_or_else(|| {
            SchemaError::malformed_config(location, format!("unknown type '{}'", field.type_tag))
        })?;
        if field.schema.is_some() {
            return Err(SchemaError::malformed_config(
                location,
                format!("'{}' fields cannot carry a nested schema", field.type_tag),
            ));
        }

        Ok(if is_array {
            FieldKind::ArrayOfScalar(scalar)
        } else {
            FieldKind::Scalar(scalar)
        })
    }
}

/// Field names must be addressable as a single path segment.
fn check_field_name(name: &str, location: &str) -> SchemaResult<()> {
    if name.is_empty() || name.contains('.') || name.starts_with('$') {
        return Err(SchemaError::malformed_config(
            location,
            format!("'{}' is not a valid field name", name),
        ));
    }
    Ok(())
}
