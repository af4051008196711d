//! JSON I/O handling for the CLI
//!
//! - Input: one Extended JSON document via stdin
//! - Output: one JSON object via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value as Json;

use bson::Document;

use crate::schema::document_from_extended_json;

use super::errors::{CliError, CliResult};

/// Read one document from stdin
pub fn read_document() -> CliResult<Document> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_document(&input)
}

/// Parse Extended JSON text into a document
pub fn parse_document(input: &str) -> CliResult<Document> {
    if input.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }

    let json: Json = serde_json::from_str(input)?;
    document_from_extended_json(json).map_err(|e| CliError::invalid_input(e.to_string()))
}

/// Success envelope: `{"status": "ok", "data": ...}`
pub fn success_response(data: Json) -> Json {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope: `{"status": "error", "code": ..., "message": ...}`
pub fn error_response(code: &str, message: &str) -> Json {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: Json) -> CliResult<()> {
    write_line(&success_response(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_response(code, message))
}

fn write_line(response: &Json) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use bson::Bson;
    use serde_json::json;

    #[test]
    fn test_parse_document() {
        let doc = parse_document(r#"{"$set": {"a": {"$numberLong": "5"}}}"#).unwrap();
        let set = doc.get_document("$set").unwrap();
        assert_eq!(set.get("a"), Some(&Bson::Int64(5)));
    }

    #[test]
    fn test_out_of_range_decimal_is_invalid_input() {
        let err = parse_document(r#"{"d": {"$numberDecimal": "1e999999999999"}}"#).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidInput);
    }

    #[test]
    fn test_response_envelopes() {
        assert_eq!(
            success_response(json!({"valid": true})),
            json!({"status": "ok", "data": {"valid": true}})
        );
        assert_eq!(
            error_response("SCHEMA_UNKNOWN_FIELD", "unknown field 'b'"),
            json!({"status": "error", "code": "SCHEMA_UNKNOWN_FIELD", "message": "unknown field 'b'"})
        );
    }

    #[test]
    fn test_rejects_empty_and_non_documents() {
        assert_eq!(parse_document("  \n").unwrap_err().code(), CliErrorCode::InvalidInput);
        assert_eq!(parse_document("[1]").unwrap_err().code(), CliErrorCode::InvalidInput);
        assert_eq!(parse_document("{").unwrap_err().code(), CliErrorCode::InvalidInput);
    }
}
