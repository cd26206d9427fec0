//! `createSemanticModel`: create a semantic model from TMDL files.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::{error, info};

use crate::convert::{decode_args, encode_result, required_files, required_text};
use crate::error::{McpError, Result};
use crate::fabric::{FabricApi, FailureKind};
use crate::models::{CreateSemanticModelRequest, CreateSemanticModelResponse, OperationStatus};
use crate::schema;
use crate::tools::{Tool, ToolDef};

/// Tool name.
pub const NAME: &str = "createSemanticModel";

/// Creates semantic models through [`FabricApi::create_semantic_model`].
pub struct CreateSemanticModelTool {
    fabric: Arc<dyn FabricApi>,
}

impl CreateSemanticModelTool {
    /// Handler backed by `fabric`.
    pub fn new(fabric: Arc<dyn FabricApi>) -> Self {
        Self { fabric }
    }

    /// Validate `request`, create the model and return its identifier.
    pub async fn execute(
        &self,
        request: CreateSemanticModelRequest,
    ) -> Result<CreateSemanticModelResponse> {
        let name = required_text(request.name.as_deref(), "Model name is required.")?;
        let files = required_files(
            request.tmdl_files.as_ref(),
            "At least one TMDL file is required.",
        )?;
        info!(model = name, files = files.len(), "Starting the creation of semantic model");

        match self.fabric.create_semantic_model(&request).await {
            Ok(model_id) => {
                info!(model = name, %model_id, "Semantic model created");
                Ok(CreateSemanticModelResponse {
                    model_id,
                    status: OperationStatus::Created,
                })
            }
            Err(err) => {
                error!(model = name, error = %err, "Failed to create semantic model");
                let message = match err.kind() {
                    FailureKind::InvalidOperation => {
                        format!("Failed to create semantic model: {}", err)
                    }
                    FailureKind::Http => format!("Failed to communicate with Fabric API: {}", err),
                    FailureKind::Unexpected => format!("An unexpected error occurred: {}", err),
                };
                Err(McpError::internal(message).with_source(err))
            }
        }
    }
}

#[async_trait]
impl Tool for CreateSemanticModelTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            NAME,
            "Creates a new semantic model in Fabric from TMDL files. tmdlFiles maps each \
             relative file path (e.g. 'model.tmdl', 'tables/Sales.tmdl') to its content; the \
             files are packaged into a single archive and uploaded. Returns the new model ID.",
            schema!(object {
                required: { "name": string, "tmdlFiles": file_map },
                optional: { "description": string }
            }),
        )
    }

    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let request = decode_args(args)?;
        encode_result(&self.execute(request).await?)
    }
}
