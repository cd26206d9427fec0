//! Conversion between JSON tool arguments and typed request/response payloads,
//! plus the precondition checks every handler runs before delegating.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::models::TmdlFiles;

/// Decode a tool's argument object into its request type.
pub fn decode_args<T: DeserializeOwned>(args: Map<String, JsonValue>) -> Result<T> {
    serde_json::from_value(JsonValue::Object(args)).map_err(|e| {
        McpError::invalid_params(format!("Invalid arguments: {}", e)).with_source(e)
    })
}

/// Encode a response payload as JSON.
pub fn encode_result<T: Serialize>(value: &T) -> Result<JsonValue> {
    Ok(serde_json::to_value(value)?)
}

/// Require a non-blank string, failing with `InvalidParams(message)`.
pub fn required_text<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(McpError::invalid_params(message)),
    }
}

/// Require a non-empty file map, failing with `InvalidParams(message)`.
pub fn required_files<'a>(files: Option<&'a TmdlFiles>, message: &str) -> Result<&'a TmdlFiles> {
    match files {
        Some(files) if !files.is_empty() => Ok(files),
        _ => Err(McpError::invalid_params(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::models::CreateSemanticModelRequest;
    use serde_json::json;

    #[test]
    fn wrong_argument_types_are_invalid_params() {
        let args = json!({ "name": 42 }).as_object().cloned().unwrap();
        let err = decode_args::<CreateSemanticModelRequest>(args).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
        assert!(err.message().starts_with("Invalid arguments:"));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(required_text(Some("x"), "required").is_ok());
        for value in [None, Some(""), Some("   ")] {
            let err = required_text(value, "Model ID is required.").unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidParams);
            assert_eq!(err.message(), "Model ID is required.");
        }
    }

    #[test]
    fn empty_files_are_rejected() {
        let empty = TmdlFiles::new();
        assert!(required_files(None, "m").is_err());
        assert!(required_files(Some(&empty), "m").is_err());

        let mut files = TmdlFiles::new();
        files.insert("model.tmdl".into(), String::new());
        assert!(required_files(Some(&files), "m").is_ok());
    }
}
