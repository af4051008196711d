//! Runtime document model handed to the validators
//!
//! Documents are `bson` documents, the same representation the proxy
//! decodes from the wire. Field order is preserved and keys are unique.
//! Text input (CLI, fixtures) arrives as relaxed or canonical Extended JSON.

use bson::{Bson, Document};
use serde_json::Value as Json;
use thiserror::Error;

/// Extended JSON could not be converted into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid extended JSON: {reason}")]
pub struct ConversionError {
    pub reason: String,
}

impl ConversionError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Converts Extended JSON into a document.
///
/// Type wrappers (`$oid`, `$date`, `$numberDecimal`, ...) become the
/// matching BSON values; any other `$`-key, such as an update operator,
/// stays an ordinary field.
pub fn document_from_extended_json(json: Json) -> Result<Document, ConversionError> {
    match Bson::try_from(json).map_err(|e| ConversionError::new(e.to_string()))? {
        Bson::Document(doc) => Ok(doc),
        other => Err(ConversionError::new(format!(
            "expected a document, got {}",
            type_name(&other)
        ))),
    }
}

/// Type name used in error messages
pub fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::JavaScriptCodeWithScope(_) => "javascriptWithScope",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}
