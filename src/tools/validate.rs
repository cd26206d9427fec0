//! `validateTmdl`: validate TMDL files without touching the service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::{error, info};

use crate::convert::{decode_args, encode_result, required_files};
use crate::error::{McpError, Result};
use crate::models::{ValidateTmdlRequest, ValidationResult};
use crate::schema;
use crate::tools::{Tool, ToolDef};
use crate::validator::TmdlValidator;

/// Tool name.
pub const NAME: &str = "validateTmdl";

/// Runs a [`TmdlValidator`] and passes its result through unchanged.
///
/// An invalid result is a successful call; only validator failures become errors.
pub struct ValidateTmdlTool {
    validator: Arc<dyn TmdlValidator>,
}

impl ValidateTmdlTool {
    /// Handler backed by `validator`.
    pub fn new(validator: Arc<dyn TmdlValidator>) -> Self {
        Self { validator }
    }

    /// Validate the files in `request`.
    pub async fn execute(&self, request: ValidateTmdlRequest) -> Result<ValidationResult> {
        let files = required_files(
            request.tmdl_files.as_ref(),
            "TMDL files must be provided for validation.",
        )?;
        info!(files = files.len(), "Validating TMDL files");

        self.validator.validate(files).await.map_err(|err| {
            error!(error = %err, "TMDL validation failed");
            McpError::internal(format!("TMDL validation failed: {}", err)).with_source(err)
        })
    }
}

#[async_trait]
impl Tool for ValidateTmdlTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            NAME,
            "Validates TMDL files for syntax and semantic errors. Returns isValid, the list of \
             findings (fileName, lineNumber, column, message, errorCode, severity) and a summary. \
             Nothing is sent to Fabric.",
            schema!(object {
                required: { "tmdlFiles": file_map }
            }),
        )
    }

    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let request = decode_args(args)?;
        encode_result(&self.execute(request).await?)
    }
}
