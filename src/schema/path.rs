//! Dotted update paths and their resolution against a schema tree.
//!
//! Path grammar, per segment:
//! - `<digits>`: array index
//! - `$`: first matched element
//! - `$[]`: every element
//! - `$[<identifier>]`: elements matched by an array filter
//! - anything else: field name
//!
//! The four projection forms all mean "the element schema of this array".

use std::fmt;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldKind, FieldSchema, ObjectSchema, ScalarType};

/// One segment of a dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Field(&'a str),
    /// Array index, kept as written; any length of digits is accepted
    Index(&'a str),
    Positional,
    AllPositional,
    Filtered(&'a str),
}

impl<'a> PathSegment<'a> {
    /// Classifies a single segment.
    ///
    /// Returns `None` for an empty segment or a malformed `$[...]` form.
    pub fn parse(raw: &'a str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        if raw == "$" {
            return Some(PathSegment::Positional);
        }
        if raw == "$[]" {
            return Some(PathSegment::AllPositional);
        }
        if let Some(rest) = raw.strip_prefix("$[") {
            let ident = rest.strip_suffix(']')?;
            let valid = ident
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_lowercase())
                && ident.chars().all(|c| c.is_ascii_alphanumeric());
            return valid.then_some(PathSegment::Filtered(ident));
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return Some(PathSegment::Index(raw));
        }
        Some(PathSegment::Field(raw))
    }
}

impl fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(digits) => f.write_str(digits),
            PathSegment::Positional => f.write_str("$"),
            PathSegment::AllPositional => f.write_str("$[]"),
            PathSegment::Filtered(ident) => write!(f, "$[{}]", ident),
        }
    }
}

/// Splits a dotted path into classified segments.
pub fn parse_path(path: &str) -> SchemaResult<Vec<PathSegment<'_>>> {
    path.split('.')
        .map(|raw| {
            PathSegment::parse(raw).ok_or_else(|| {
                SchemaError::structural(path, format!("malformed path segment '{}'", raw))
            })
        })
        .collect()
}

/// What a resolved path designates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Terminal<'s> {
    /// A scalar field, or one element of an array of scalars
    Scalar(ScalarType),
    /// A whole array field
    Array(&'s FieldSchema),
    /// A nested object, or one element of an array of objects
    Object(&'s ObjectSchema),
    /// Undeclared territory under an open schema
    Unconstrained,
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'s> {
    pub terminal: Terminal<'s>,
    /// Whether any field traversed on the way is required
    pub touches_required: bool,
}

#[derive(Clone, Copy)]
enum Cursor<'s> {
    Object(&'s ObjectSchema),
    ScalarArray(&'s FieldSchema, ScalarType),
    ObjectArray(&'s FieldSchema, &'s ObjectSchema),
}

/// Walks `path` through `root`, one segment at a time.
pub fn resolve<'s>(root: &'s ObjectSchema, path: &str) -> SchemaResult<Resolution<'s>> {
    let segments = parse_path(path)?;
    let mut cursor = Cursor::Object(root);
    let mut touches_required = false;
    let mut iter = segments.iter().peekable();

    while let Some(segment) = iter.next() {
        cursor = match (cursor, segment) {
            (Cursor::Object(schema), PathSegment::Field(name)) => {
                let Some(field) = schema.field(name) else {
                    if schema.is_closed() {
                        return Err(SchemaError::unknown_field(path));
                    }
                    return Ok(Resolution {
                        terminal: Terminal::Unconstrained,
                        touches_required,
                    });
                };
                touches_required |= field.is_required();

                match field.kind() {
                    FieldKind::Scalar(scalar) => {
                        if let Some(next) = iter.peek() {
                            return Err(SchemaError::structural(
                                path,
                                format!("'{}' is a {} field and has no child '{}'", name, scalar, next),
                            ));
                        }
                        return Ok(Resolution {
                            terminal: Terminal::Scalar(*scalar),
                            touches_required,
                        });
                    }
                    FieldKind::Object(nested) => Cursor::Object(nested),
                    FieldKind::ArrayOfScalar(element) => Cursor::ScalarArray(field, *element),
                    FieldKind::ArrayOfObject(element) => Cursor::ObjectArray(field, element),
                }
            }
            (Cursor::Object(_), projection) => {
                return Err(SchemaError::structural(
                    path,
                    format!("array projection '{}' applied to a non-array field", projection),
                ));
            }
            (Cursor::ScalarArray(field, _) | Cursor::ObjectArray(field, _), PathSegment::Field(name)) => {
                return Err(SchemaError::structural(
                    path,
                    format!(
                        "array field '{}' must be addressed through a projection, not '{}'",
                        field.name(),
                        name
                    ),
                ));
            }
            (Cursor::ScalarArray(field, element), _) => {
                if let Some(next) = iter.peek() {
                    return Err(SchemaError::structural(
                        path,
                        format!(
                            "elements of '{}' are {} values and have no child '{}'",
                            field.name(),
                            element,
                            next
                        ),
                    ));
                }
                return Ok(Resolution {
                    terminal: Terminal::Scalar(element),
                    touches_required,
                });
            }
            (Cursor::ObjectArray(_, element), _) => Cursor::Object(element),
        };
    }

    let terminal = match cursor {
        Cursor::Object(schema) => Terminal::Object(schema),
        Cursor::ScalarArray(field, _) | Cursor::ObjectArray(field, _) => Terminal::Array(field),
    };
    Ok(Resolution {
        terminal,
        touches_required,
    })
}
