//! Schema type definitions
//!
//! Supported type tags:
//! - int, long: any fixed-width integer
//! - double: any integer or floating-point number
//! - string, bool, bindata, objectid, regex, decimal: exact native type
//! - date: epoch integer or native date/time
//! - object: nested object schema
//! - []<type>: homogeneous array of any of the above

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Scalar type tags, usable on their own or as array element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int,
    Long,
    Double,
    String,
    BinData,
    ObjectId,
    Bool,
    Date,
    Regex,
    Decimal,
}

impl ScalarType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::BinData => "bindata",
            ScalarType::ObjectId => "objectid",
            ScalarType::Bool => "bool",
            ScalarType::Date => "date",
            ScalarType::Regex => "regex",
            ScalarType::Decimal => "decimal",
        }
    }

    /// Parses a scalar type tag, ignoring case.
    pub fn parse(tag: &str) -> Option<Self> {
        let scalar = match tag.to_ascii_lowercase().as_str() {
            "int" => ScalarType::Int,
            "long" => ScalarType::Long,
            "double" => ScalarType::Double,
            "string" => ScalarType::String,
            "bindata" => ScalarType::BinData,
            "objectid" => ScalarType::ObjectId,
            "bool" => ScalarType::Bool,
            "date" => ScalarType::Date,
            "regex" => ScalarType::Regex,
            "decimal" => ScalarType::Decimal,
            _ => return None,
        };
        Some(scalar)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Shape of a declared field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarType),
    /// Nested document; the schema may be shared with other fields
    Object(Arc<ObjectSchema>),
    ArrayOfScalar(ScalarType),
    ArrayOfObject(Arc<ObjectSchema>),
}

impl FieldKind {
    /// Returns the type name as written in configuration
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Scalar(t) => t.type_name().to_string(),
            FieldKind::Object(_) => "object".to_string(),
            FieldKind::ArrayOfScalar(t) => format!("[]{}", t.type_name()),
            FieldKind::ArrayOfObject(_) => "[]object".to_string(),
        }
    }
}

/// One declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    name: String,
    kind: FieldKind,
    /// Must be present on insert, may never be removed by an update
    required: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
        }
    }

    /// Create a required scalar field
    pub fn required(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldKind::Scalar(scalar), true)
    }

    /// Create an optional scalar field
    pub fn optional(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldKind::Scalar(scalar), false)
    }

    /// Create a required object field
    pub fn required_object(name: impl Into<String>, schema: Arc<ObjectSchema>) -> Self {
        Self::new(name, FieldKind::Object(schema), true)
    }

    /// Create an optional object field
    pub fn optional_object(name: impl Into<String>, schema: Arc<ObjectSchema>) -> Self {
        Self::new(name, FieldKind::Object(schema), false)
    }

    /// Create a required array-of-scalar field
    pub fn required_array(name: impl Into<String>, element: ScalarType) -> Self {
        Self::new(name, FieldKind::ArrayOfScalar(element), true)
    }

    /// Create an optional array-of-scalar field
    pub fn optional_array(name: impl Into<String>, element: ScalarType) -> Self {
        Self::new(name, FieldKind::ArrayOfScalar(element), false)
    }

    /// Create an optional array-of-object field
    pub fn optional_object_array(name: impl Into<String>, element: Arc<ObjectSchema>) -> Self {
        Self::new(name, FieldKind::ArrayOfObject(element), false)
    }

    /// Create a required array-of-object field
    pub fn required_object_array(name: impl Into<String>, element: Arc<ObjectSchema>) -> Self {
        Self::new(name, FieldKind::ArrayOfObject(element), true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// A node of the schema tree: the collection root, a nested object, or
/// the element schema of an array of objects.
///
/// Immutable once built. Subtrees are shared by `Arc`, never copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: BTreeMap<String, FieldSchema>,
    /// Undeclared field names are rejected when set
    closed: bool,
}

impl ObjectSchema {
    /// An open schema with no declared fields
    pub fn open() -> Self {
        Self::default()
    }

    /// A closed schema with no declared fields
    pub fn closed() -> Self {
        Self {
            fields: BTreeMap::new(),
            closed: true,
        }
    }

    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    /// Adds a field declaration. A later declaration with the same name wins.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Names of fields that must be present, in name order
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.fields
            .values()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> ObjectSchema {
        ObjectSchema::closed()
            .with_field(FieldSchema::required("name", ScalarType::String))
            .with_field(FieldSchema::optional("age", ScalarType::Int))
            .with_field(FieldSchema::required_array("tags", ScalarType::String))
    }

    #[test]
    fn test_required_set_follows_fields() {
        let schema = users_schema();
        let required: Vec<_> = schema.required().collect();
        assert_eq!(required, vec!["name", "tags"]);
        assert!(schema.is_closed());
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_redeclared_field_replaces() {
        let schema = ObjectSchema::open()
            .with_field(FieldSchema::required("a", ScalarType::String))
            .with_field(FieldSchema::optional("a", ScalarType::Int));

        assert_eq!(schema.len(), 1);
        assert_eq!(schema.required().count(), 0);
        assert_eq!(
            schema.field("a").unwrap().kind(),
            &FieldKind::Scalar(ScalarType::Int)
        );
    }

    #[test]
    fn test_shared_subschema_is_not_copied() {
        let address = ObjectSchema::open()
            .with_field(FieldSchema::required("city", ScalarType::String))
            .into_shared();

        let root = ObjectSchema::open()
            .with_field(FieldSchema::optional_object("home", address.clone()))
            .with_field(FieldSchema::optional_object_array("past", address.clone()));

        match (root.field("home").unwrap().kind(), root.field("past").unwrap().kind()) {
            (FieldKind::Object(a), FieldKind::ArrayOfObject(b)) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("unexpected kinds {:?}", other),
        }
    }

    #[test]
    fn test_scalar_parse_is_case_insensitive() {
        assert_eq!(ScalarType::parse("objectID"), Some(ScalarType::ObjectId));
        assert_eq!(ScalarType::parse("BinData"), Some(ScalarType::BinData));
        assert_eq!(ScalarType::parse("object"), None);
        assert_eq!(ScalarType::parse("float"), None);
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldKind::Scalar(ScalarType::Bool).type_name(), "bool");
        assert_eq!(FieldKind::ArrayOfScalar(ScalarType::Long).type_name(), "[]long");
        assert_eq!(
            FieldKind::ArrayOfObject(ObjectSchema::open().into_shared()).type_name(),
            "[]object"
        );
    }
}
