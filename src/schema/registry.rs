//! Schema registry: (database, collection) -> collection root schema.
//!
//! The registry is an allow-list. A collection without a schema is
//! rejected by every validator, including collections meant to accept
//! arbitrary documents (those declare an empty open schema).
//!
//! Built once, then only read. Share it behind an `Arc` across threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::types::ObjectSchema;

/// Immutable registry of collection schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    databases: BTreeMap<String, BTreeMap<String, Arc<ObjectSchema>>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Returns the root schema of a collection.
    pub fn lookup(&self, database: &str, collection: &str) -> SchemaResult<&Arc<ObjectSchema>> {
        self.databases
            .get(database)
            .and_then(|collections| collections.get(collection))
            .ok_or_else(|| SchemaError::unknown_collection(database, collection))
    }

    pub fn contains(&self, database: &str, collection: &str) -> bool {
        self.lookup(database, collection).is_ok()
    }

    pub fn databases(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    /// Collection names of a database, empty if the database is unknown
    pub fn collections<'a>(&'a self, database: &str) -> impl Iterator<Item = &'a str> {
        self.databases
            .get(database)
            .into_iter()
            .flat_map(|collections| collections.keys().map(String::as_str))
    }

    /// Number of registered collections across all databases
    pub fn len(&self) -> usize {
        self.databases.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates collection schemas before freezing them into a registry
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    databases: BTreeMap<String, BTreeMap<String, Arc<ObjectSchema>>>,
}

impl SchemaRegistryBuilder {
    /// Registers a collection root. Registering the same collection twice is an error.
    pub fn register(
        &mut self,
        database: impl Into<String>,
        collection: impl Into<String>,
        schema: Arc<ObjectSchema>,
    ) -> SchemaResult<&mut Self> {
        let database = database.into();
        let collection = collection.into();
        let collections = self.databases.entry(database.clone()).or_default();

        if collections.contains_key(&collection) {
            return Err(SchemaError::malformed_config(
                format!("{}.{}", database, collection),
                "collection schema registered twice",
            ));
        }

        collections.insert(collection, schema);
        Ok(self)
    }

    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            databases: self.databases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::types::{FieldSchema, ScalarType};

    fn registry() -> SchemaRegistry {
        let users = ObjectSchema::closed()
            .with_field(FieldSchema::required("name", ScalarType::String))
            .into_shared();

        let mut builder = SchemaRegistry::builder();
        builder
            .register("app", "users", users)
            .unwrap()
            .register("app", "events", ObjectSchema::open().into_shared())
            .unwrap()
            .register("audit", "log", ObjectSchema::open().into_shared())
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_lookup_registered_collection() {
        let registry = registry();
        let schema = registry.lookup("app", "users").unwrap();
        assert!(schema.is_closed());
        assert!(registry.contains("audit", "log"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_collection_rejected() {
        let registry = registry();
        let err = registry.lookup("app", "hidden").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownCollection);

        let err = registry.lookup("other", "users").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownCollection);
    }

    #[test]
    fn test_listing() {
        let registry = registry();
        assert_eq!(registry.databases().collect::<Vec<_>>(), vec!["app", "audit"]);
        assert_eq!(registry.collections("app").collect::<Vec<_>>(), vec!["events", "users"]);
        assert_eq!(registry.collections("missing").count(), 0);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder.register("app", "users", ObjectSchema::open().into_shared()).unwrap();
        let err = builder
            .register("app", "users", ObjectSchema::open().into_shared())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_registry() {
        let registry = SchemaRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.lookup("a", "b").is_err());
    }
}
