//! `deploySemanticModel`: deploy a model to a target environment.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::{error, info};

use crate::convert::{decode_args, encode_result, required_text};
use crate::error::{McpError, Result};
use crate::fabric::{FabricApi, FailureKind, RequestBody, DEPLOYMENTS_PATH};
use crate::models::{DeploymentRequest, DeploymentResponse, OperationStatus};
use crate::schema;
use crate::tools::{Tool, ToolDef};

/// Tool name.
pub const NAME: &str = "deploySemanticModel";

/// Posts deployments to the generic deployment endpoint.
pub struct DeploySemanticModelTool {
    fabric: Arc<dyn FabricApi>,
}

impl DeploySemanticModelTool {
    /// Handler backed by `fabric`.
    pub fn new(fabric: Arc<dyn FabricApi>) -> Self {
        Self { fabric }
    }

    /// Validate `request` and deploy.
    pub async fn execute(&self, request: DeploymentRequest) -> Result<DeploymentResponse> {
        let model_id = required_text(request.model_id.as_deref(), "Model ID is required.")?;
        let target = required_text(
            request.target_environment.as_deref(),
            "Target environment is required.",
        )?;
        info!(model_id, target, "Deploying semantic model");

        let body = RequestBody::Json(serde_json::json!({
            "modelId": model_id,
            "targetEnvironment": target,
        }));
        let response = self
            .fabric
            .post(DEPLOYMENTS_PATH, body)
            .await
            .map_err(|err| {
                error!(model_id, target, error = %err, "Deployment request failed");
                let message = match err.kind() {
                    FailureKind::Http => format!("Failed to communicate with Fabric API: {}", err),
                    _ => format!("An unexpected error occurred during deployment: {}", err),
                };
                McpError::internal(message).with_source(err)
            })?;

        if !response.is_success() {
            let reason = response.reason_phrase();
            error!(model_id, target, status = response.status, %reason, "Deployment rejected");
            return Err(McpError::internal(format!(
                "Deployment failed with status code {}: {}",
                response.status, reason
            )));
        }

        info!(model_id, target, "Semantic model deployed");
        Ok(DeploymentResponse {
            status: OperationStatus::Deployed,
            deployment_details: format!(
                "Semantic model {} deployed to {}",
                model_id, target
            ),
            model_id: model_id.to_string(),
            target_environment: target.to_string(),
        })
    }
}

#[async_trait]
impl Tool for DeploySemanticModelTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            NAME,
            "Deploys a semantic model to the specified target environment (e.g. 'Test', \
             'Production'). Fails with the service's status code and reason when the \
             deployment is rejected.",
            schema!(object {
                required: { "modelId": string, "targetEnvironment": string }
            }),
        )
    }

    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let request = decode_args(args)?;
        encode_result(&self.execute(request).await?)
    }
}
