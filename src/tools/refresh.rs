//! `refreshSemanticModel`: trigger a data refresh.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::{error, info};

use crate::convert::{decode_args, encode_result, required_text};
use crate::error::{McpError, Result};
use crate::fabric::FabricApi;
use crate::models::{OperationStatus, RefreshSemanticModelRequest, RefreshSemanticModelResponse};
use crate::schema;
use crate::tools::{Tool, ToolDef};

/// Tool name.
pub const NAME: &str = "refreshSemanticModel";

/// Triggers refreshes through [`FabricApi::refresh_semantic_model`].
pub struct RefreshSemanticModelTool {
    fabric: Arc<dyn FabricApi>,
}

impl RefreshSemanticModelTool {
    /// Handler backed by `fabric`.
    pub fn new(fabric: Arc<dyn FabricApi>) -> Self {
        Self { fabric }
    }

    /// Validate `request` and start the refresh.
    pub async fn execute(
        &self,
        request: RefreshSemanticModelRequest,
    ) -> Result<RefreshSemanticModelResponse> {
        let model_id = required_text(request.model_id.as_deref(), "Model ID is required.")?;
        let refresh_type = request.effective_refresh_type();
        info!(model_id, refresh_type, "Starting refresh for semantic model");

        let started = self
            .fabric
            .refresh_semantic_model(model_id, refresh_type)
            .await
            .map_err(|err| {
                error!(model_id, error = %err, "Refresh request failed");
                McpError::internal(format!(
                    "An unexpected error occurred during refresh: {}",
                    err
                ))
                .with_source(err)
            })?;

        let (status, outcome) = if started {
            (OperationStatus::Refreshing, "started successfully")
        } else {
            (OperationStatus::Failed, "failed to start")
        };
        Ok(RefreshSemanticModelResponse {
            status,
            refresh_details: format!("Refresh operation for model {} {}", model_id, outcome),
        })
    }
}

#[async_trait]
impl Tool for RefreshSemanticModelTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            NAME,
            "Triggers a refresh operation for a semantic model in Fabric. type selects the \
             refresh type (Full, ClearValues, Calculate, DataOnly, Automatic, Defragment) and \
             defaults to Full. Returns status 'Refreshing' once the refresh is accepted.",
            schema!(object {
                required: { "modelId": string },
                optional: { "type": string }
            }),
        )
    }

    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let request = decode_args(args)?;
        encode_result(&self.execute(request).await?)
    }
}
