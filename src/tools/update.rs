//! `updateSemanticModel`: replace a semantic model's definition.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::{error, info};

use crate::convert::{decode_args, encode_result, required_files, required_text};
use crate::error::{McpError, Result};
use crate::fabric::{FabricApi, FailureKind};
use crate::models::{OperationStatus, UpdateSemanticModelRequest, UpdateSemanticModelResponse};
use crate::schema;
use crate::tools::{Tool, ToolDef};

/// Tool name.
pub const NAME: &str = "updateSemanticModel";

/// Updates semantic models through [`FabricApi::update_semantic_model`].
///
/// A rejected update is reported as a `Failed` status, not as an error.
pub struct UpdateSemanticModelTool {
    fabric: Arc<dyn FabricApi>,
}

impl UpdateSemanticModelTool {
    /// Handler backed by `fabric`.
    pub fn new(fabric: Arc<dyn FabricApi>) -> Self {
        Self { fabric }
    }

    /// Validate `request` and push the new definition.
    pub async fn execute(
        &self,
        request: UpdateSemanticModelRequest,
    ) -> Result<UpdateSemanticModelResponse> {
        let model_id = required_text(request.model_id.as_deref(), "Model ID is required.")?;
        let files = required_files(
            request.tmdl_files.as_ref(),
            "At least one TMDL file is required.",
        )?;
        info!(model_id, files = files.len(), "Updating semantic model");

        let updated = self
            .fabric
            .update_semantic_model(model_id, files)
            .await
            .map_err(|err| {
                error!(model_id, error = %err, "Failed to update semantic model");
                let message = match err.kind() {
                    FailureKind::InvalidOperation => {
                        format!("Failed to update semantic model {}: {}", model_id, err)
                    }
                    FailureKind::Http => {
                        format!("Failed to communicate with Fabric API: {}", err)
                    }
                    FailureKind::Unexpected => format!(
                        "An unexpected error occurred while updating semantic model {}: {}",
                        model_id, err
                    ),
                };
                McpError::internal(message).with_source(err)
            })?;

        let (status, outcome) = if updated {
            (OperationStatus::Updated, "completed successfully")
        } else {
            (OperationStatus::Failed, "failed")
        };
        Ok(UpdateSemanticModelResponse {
            status,
            updated_details: format!("Semantic model {} update {}", model_id, outcome),
        })
    }
}

#[async_trait]
impl Tool for UpdateSemanticModelTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            NAME,
            "Updates an existing semantic model in Fabric with new TMDL files. The supplied \
             files replace the model definition. Returns status 'Updated', or 'Failed' when \
             the service rejects the update.",
            schema!(object {
                required: { "modelId": string, "tmdlFiles": file_map }
            }),
        )
    }

    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let request = decode_args(args)?;
        encode_result(&self.execute(request).await?)
    }
}
