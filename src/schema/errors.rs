//! Schema error types
//!
//! Error codes:
//! - SCHEMA_UNKNOWN_COLLECTION (REJECT)
//! - SCHEMA_MISSING_REQUIRED_FIELD (REJECT)
//! - SCHEMA_UNKNOWN_FIELD (REJECT)
//! - SCHEMA_TYPE_MISMATCH (REJECT)
//! - SCHEMA_STRUCTURAL_PATH (REJECT)
//! - SCHEMA_PROTECTED_FIELD_REMOVAL (REJECT)
//! - SCHEMA_MALFORMED_CONFIG (FATAL)

use std::fmt;

use thiserror::Error;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The intercepted write is rejected
    Reject,
    /// The proxy cannot start with this configuration
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Stable error codes reported back to the write's originator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    UnknownCollection,
    MissingRequiredField,
    UnknownField,
    TypeMismatch,
    StructuralPath,
    ProtectedFieldRemoval,
    MalformedConfig,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnknownCollection => "SCHEMA_UNKNOWN_COLLECTION",
            SchemaErrorCode::MissingRequiredField => "SCHEMA_MISSING_REQUIRED_FIELD",
            SchemaErrorCode::UnknownField => "SCHEMA_UNKNOWN_FIELD",
            SchemaErrorCode::TypeMismatch => "SCHEMA_TYPE_MISMATCH",
            SchemaErrorCode::StructuralPath => "SCHEMA_STRUCTURAL_PATH",
            SchemaErrorCode::ProtectedFieldRemoval => "SCHEMA_PROTECTED_FIELD_REMOVAL",
            SchemaErrorCode::MalformedConfig => "SCHEMA_MALFORMED_CONFIG",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::MalformedConfig => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type.
///
/// Validation is fail-fast: every error describes the first violation found.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// No schema registered for (database, collection)
    #[error("no schema registered for collection '{database}.{collection}'")]
    UnknownCollection { database: String, collection: String },

    /// Insert omits a required field
    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },

    /// Field not declared in a closed schema
    #[error("field '{field}' is not declared in a closed schema")]
    UnknownField { field: String },

    /// Runtime value does not satisfy the declared type
    #[error("field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: &'static str,
    },

    /// Update path does not fit the shape of the schema
    #[error("invalid path '{path}': {reason}")]
    StructuralPath { path: String, reason: String },

    /// `$unset` or `$rename` targets a required field
    #[error("{operator} may not remove required field '{path}'")]
    ProtectedFieldRemoval { operator: String, path: String },

    /// Schema configuration could not be turned into a registry
    #[error("malformed schema configuration at '{location}': {reason}")]
    MalformedConfig { location: String, reason: String },
}

impl SchemaError {
    /// Create an unknown collection error
    pub fn unknown_collection(database: impl Into<String>, collection: impl Into<String>) -> Self {
        SchemaError::UnknownCollection {
            database: database.into(),
            collection: collection.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        SchemaError::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        SchemaError::UnknownField {
            field: field.into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: &'static str,
    ) -> Self {
        SchemaError::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn structural(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::StructuralPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn protected_removal(operator: impl Into<String>, path: impl Into<String>) -> Self {
        SchemaError::ProtectedFieldRemoval {
            operator: operator.into(),
            path: path.into(),
        }
    }

    /// Create an error for a malformed schema configuration
    pub fn malformed_config(location: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::MalformedConfig {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        match self {
            SchemaError::UnknownCollection { .. } => SchemaErrorCode::UnknownCollection,
            SchemaError::MissingRequiredField { .. } => SchemaErrorCode::MissingRequiredField,
            SchemaError::UnknownField { .. } => SchemaErrorCode::UnknownField,
            SchemaError::TypeMismatch { .. } => SchemaErrorCode::TypeMismatch,
            SchemaError::StructuralPath { .. } => SchemaErrorCode::StructuralPath,
            SchemaError::ProtectedFieldRemoval { .. } => SchemaErrorCode::ProtectedFieldRemoval,
            SchemaError::MalformedConfig { .. } => SchemaErrorCode::MalformedConfig,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
