//! Type matching with a fixed widening table.
//!
//! Matching is total and side-effect free. Null never matches; presence is
//! checked separately from type. Nested documents are not judged here, the
//! validator recurses into them with their own schema.

use bson::Bson;

use super::types::ScalarType;

/// Decides whether `value` satisfies the scalar type tag.
pub fn matches(expected: ScalarType, value: &Bson) -> bool {
    let integer = matches!(value, Bson::Int32(_) | Bson::Int64(_));
    match expected {
        ScalarType::Int | ScalarType::Long => integer,
        ScalarType::Double => integer || matches!(value, Bson::Double(_)),
        ScalarType::Date => integer || matches!(value, Bson::DateTime(_)),
        ScalarType::String => matches!(value, Bson::String(_)),
        ScalarType::Bool => matches!(value, Bson::Boolean(_)),
        ScalarType::BinData => matches!(value, Bson::Binary(_)),
        ScalarType::ObjectId => matches!(value, Bson::ObjectId(_)),
        ScalarType::Regex => matches!(value, Bson::RegularExpression(_)),
        ScalarType::Decimal => matches!(value, Bson::Decimal128(_)),
    }
}

/// Decides whether `value` is a sequence whose every element satisfies
/// `element`. An empty sequence always matches.
pub fn matches_array(element: ScalarType, value: &Bson) -> bool {
    value
        .as_array()
        .map_or(false, |items| items.iter().all(|item| matches(element, item)))
}

/// Index of the first element that fails to match, if any.
pub(crate) fn first_mismatch(element: ScalarType, items: &[Bson]) -> Option<usize> {
    items.iter().position(|item| !matches(element, item))
}
