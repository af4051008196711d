//! Schema enforcement for intercepted writes
//!
//! Every write routed through the proxy is judged against the declared
//! structure of its collection before it is forwarded.
//!
//! # Design Principles
//!
//! - Unknown collections are rejected (the registry is an allow-list)
//! - Inserts are checked as whole documents
//! - Updates are checked per touched path, never for presence
//! - Required fields can never be removed
//! - First violation wins; no aggregation
//! - Schemas are immutable after load and shared across threads

mod context;
mod errors;
mod loader;
mod matcher;
mod path;
mod registry;
mod types;
mod validator;
mod value;

pub use context::ValidationContext;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::SchemaLoader;
pub use matcher::{matches, matches_array};
pub use path::{parse_path, resolve, PathSegment, Resolution, Terminal};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use types::{FieldKind, FieldSchema, ObjectSchema, ScalarType};
pub use validator::{SchemaValidator, UpdateOperator};
pub use value::{document_from_extended_json, type_name, ConversionError};
