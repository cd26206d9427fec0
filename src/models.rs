//! Request and response payloads for the semantic model tools.
//!
//! Field names cross the RPC boundary in lowerCamelCase. Required fields are
//! modelled as `Option` so that a missing value reaches the handler and is
//! reported as `InvalidParams` instead of failing deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relative TMDL file path mapped to its text content.
///
/// Keys are kept exactly as supplied: case and directory separators are
/// never normalized.
pub type TmdlFiles = BTreeMap<String, String>;

/// Refresh type used when the caller does not supply one.
pub const DEFAULT_REFRESH_TYPE: &str = "Full";

/// Outcome tag carried by tool responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Model created.
    Created,
    /// Model definition replaced.
    Updated,
    /// Refresh accepted by the service.
    Refreshing,
    /// Model deployed to the target environment.
    Deployed,
    /// The service rejected the operation.
    Failed,
}

// ── Requests ─────────────────────────────────────────────────────────────

/// Arguments for `createSemanticModel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSemanticModelRequest {
    /// Display name of the new model.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Model definition files.
    #[serde(default, alias = "files")]
    pub tmdl_files: Option<TmdlFiles>,
}

/// Arguments for `updateSemanticModel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSemanticModelRequest {
    /// Identifier of the model to update.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Replacement definition files.
    #[serde(default, alias = "files")]
    pub tmdl_files: Option<TmdlFiles>,
}

/// Arguments for `refreshSemanticModel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSemanticModelRequest {
    /// Identifier of the model to refresh.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Refresh type; defaults to [`DEFAULT_REFRESH_TYPE`].
    #[serde(default, rename = "type", alias = "refreshType")]
    pub refresh_type: Option<String>,
}

impl RefreshSemanticModelRequest {
    /// Refresh type to send, falling back to `Full` when absent or blank.
    pub fn effective_refresh_type(&self) -> &str {
        self.refresh_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_REFRESH_TYPE)
    }
}

/// Arguments for `deploySemanticModel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Identifier of the model to deploy.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Environment to deploy into (e.g. "Production").
    #[serde(default)]
    pub target_environment: Option<String>,
}

/// Arguments for `validateTmdl`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTmdlRequest {
    /// Files to validate.
    #[serde(default, alias = "files")]
    pub tmdl_files: Option<TmdlFiles>,
}

// ── Responses ────────────────────────────────────────────────────────────

/// Result of `createSemanticModel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSemanticModelResponse {
    /// Identifier assigned by the service.
    pub model_id: String,
    /// Always [`OperationStatus::Created`].
    pub status: OperationStatus,
}

/// Result of `updateSemanticModel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSemanticModelResponse {
    /// `Updated` or `Failed`.
    pub status: OperationStatus,
    /// Human-readable outcome.
    pub updated_details: String,
}

/// Result of `refreshSemanticModel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSemanticModelResponse {
    /// `Refreshing` or `Failed`.
    pub status: OperationStatus,
    /// Human-readable outcome.
    pub refresh_details: String,
}

/// Result of `deploySemanticModel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResponse {
    /// Always [`OperationStatus::Deployed`].
    pub status: OperationStatus,
    /// Human-readable outcome.
    pub deployment_details: String,
    /// Deployed model.
    pub model_id: String,
    /// Environment deployed into.
    pub target_environment: String,
}

/// Outcome of validating a set of TMDL files.
///
/// `is_valid == false` is still a successful validation call; only adapter
/// failures are reported as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the files passed validation.
    pub is_valid: bool,
    /// Findings, in the order the validator reported them.
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    /// Optional one-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// File the finding refers to, relative to the submitted set.
    #[serde(default)]
    pub file_name: Option<String>,
    /// 1-based line, 0 when unknown.
    #[serde(default)]
    pub line_number: u32,
    /// 1-based column, 0 when unknown.
    #[serde(default)]
    pub column: u32,
    /// Finding text.
    pub message: String,
    /// Validator-specific code, if reported.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Severity label.
    #[serde(default = "default_severity")]
    pub severity: String,
}

fn default_severity() -> String {
    "Error".to_string()
}

impl ValidationError {
    /// A finding with only a message and the default severity.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            file_name: None,
            line_number: 0,
            column: 0,
            message: message.into(),
            error_code: None,
            severity: default_severity(),
        }
    }
}
