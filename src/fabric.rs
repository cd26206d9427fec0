//! Fabric REST API gateway.
//!
//! [`FabricApi`] exposes raw HTTP verbs that never fail on a non-2xx status,
//! plus the three semantic model operations built on top of them. Each
//! operation keeps its own failure convention:
//!
//! - [`FabricApi::create_semantic_model`] returns an error for any failure.
//! - [`FabricApi::update_semantic_model`] and [`FabricApi::refresh_semantic_model`]
//!   return `Ok(false)` when the service answers with a non-2xx status and an
//!   error only when the request could not be made at all.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveError};
use crate::config::FabricConfig;
use crate::models::{CreateSemanticModelRequest, TmdlFiles};

/// Path of the generic deployment endpoint.
pub const DEPLOYMENTS_PATH: &str = "/deployments";

/// Errors raised by the gateway.
#[derive(Debug, Error)]
pub enum FabricError {
    /// The request never produced an HTTP response.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("Response status code does not indicate success: {status} ({reason})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or response body.
        reason: String,
    },
    /// The creation response had no `id` field.
    #[error("Failed to get model ID from response")]
    MissingModelId,
    /// The response body was not valid JSON.
    #[error("Failed to parse response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    /// The definition files could not be packaged.
    #[error("Failed to package TMDL files: {0}")]
    Archive(#[from] ArchiveError),
}

/// Coarse classification used to pick a handler's message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered, but not with what the operation needs.
    InvalidOperation,
    /// Communication with the service failed.
    Http,
    /// Anything else.
    Unexpected,
}

impl FabricError {
    /// Classify this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            FabricError::MissingModelId | FabricError::InvalidResponse(_) => {
                FailureKind::InvalidOperation
            }
            FabricError::Transport(_) | FabricError::Status { .. } => FailureKind::Http,
            FabricError::Archive(_) => FailureKind::Unexpected,
        }
    }
}

/// One part of a multipart form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// Binary file field.
    File {
        /// Field name.
        name: String,
        /// File name sent with the part.
        file_name: String,
        /// MIME type of the content.
        content_type: String,
        /// File content.
        bytes: Vec<u8>,
    },
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(JsonValue),
    /// Raw bytes with an explicit content type.
    Binary {
        /// MIME type of the content.
        content_type: String,
        /// Content.
        bytes: Vec<u8>,
    },
    /// `multipart/form-data` body.
    Multipart(Vec<FormPart>),
}

/// A received HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase, when known.
    pub reason: Option<String>,
    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
    /// Response body decoded as text.
    pub body: String,
}

impl ApiResponse {
    /// Build a response with a status code and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: None,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Set the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reason phrase, falling back to the body and then the status code.
    pub fn reason_phrase(&self) -> String {
        match &self.reason {
            Some(reason) if !reason.is_empty() => reason.clone(),
            _ if !self.body.trim().is_empty() => self.body.trim().to_string(),
            _ => format!("HTTP {}", self.status),
        }
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn ensure_success(&self) -> Result<(), FabricError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(FabricError::Status {
                status: self.status,
                reason: self.reason_phrase(),
            })
        }
    }
}

/// Access to the Fabric REST API.
///
/// Implementations only need the four verbs; the semantic model operations
/// have default implementations composed from them.
#[async_trait]
pub trait FabricApi: Send + Sync {
    /// `GET path`.
    async fn get(&self, path: &str) -> Result<ApiResponse, FabricError>;

    /// `POST path`.
    async fn post(&self, path: &str, body: RequestBody) -> Result<ApiResponse, FabricError>;

    /// `PATCH path`.
    async fn patch(&self, path: &str, body: RequestBody) -> Result<ApiResponse, FabricError>;

    /// `DELETE path`.
    async fn delete(&self, path: &str) -> Result<ApiResponse, FabricError>;

    /// Collection path new semantic models are posted to.
    fn semantic_models_path(&self) -> String {
        "/v1.0/myorg/semanticModels".to_string()
    }

    /// Create a semantic model and return its identifier.
    async fn create_semantic_model(
        &self,
        request: &CreateSemanticModelRequest,
    ) -> Result<String, FabricError> {
        let name = request.name.clone().unwrap_or_default();
        info!(model = %name, "Creating semantic model");

        let archive = archive::pack(request.tmdl_files.as_ref())?;
        let body = RequestBody::Multipart(vec![
            FormPart::File {
                name: "definitionFile".to_string(),
                file_name: "model.zip".to_string(),
                content_type: "application/zip".to_string(),
                bytes: archive,
            },
            FormPart::Text {
                name: "name".to_string(),
                value: name,
            },
            FormPart::Text {
                name: "description".to_string(),
                value: request.description.clone().unwrap_or_default(),
            },
        ]);

        let response = self.post(&self.semantic_models_path(), body).await?;
        response.ensure_success()?;

        let json: JsonValue = serde_json::from_str(&response.body)?;
        json.get("id")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(FabricError::MissingModelId)
    }

    /// Replace a model's definition. `Ok(false)` when the service rejects it.
    async fn update_semantic_model(
        &self,
        model_id: &str,
        files: &TmdlFiles,
    ) -> Result<bool, FabricError> {
        info!(model_id, files = files.len(), "Updating semantic model");

        let archive = archive::pack(Some(files))?;
        let path = format!("/v1.0/myorg/semanticModels/{}/updateDefinition", model_id);
        let response = self
            .patch(
                &path,
                RequestBody::Binary {
                    content_type: "application/octet-stream".to_string(),
                    bytes: archive,
                },
            )
            .await?;

        if !response.is_success() {
            warn!(
                model_id,
                status = response.status,
                reason = %response.reason_phrase(),
                "Semantic model update rejected"
            );
        }
        Ok(response.is_success())
    }

    /// Trigger a refresh. `Ok(false)` when the service rejects it.
    async fn refresh_semantic_model(
        &self,
        model_id: &str,
        refresh_type: &str,
    ) -> Result<bool, FabricError> {
        info!(model_id, refresh_type, "Refreshing semantic model");

        let path = format!("/v1.0/myorg/datasets/{}/refreshes", model_id);
        let body = RequestBody::Json(serde_json::json!({ "type": refresh_type }));
        let response = self.post(&path, body).await?;

        if !response.is_success() {
            warn!(
                model_id,
                status = response.status,
                reason = %response.reason_phrase(),
                "Semantic model refresh rejected"
            );
        }
        Ok(response.is_success())
    }
}

/// [`FabricApi`] over a shared `reqwest` connection pool.
///
/// Cloning is cheap and clones share the pool, so one client serves any
/// number of concurrent tool calls.
#[derive(Clone)]
pub struct FabricClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    workspace_id: Option<String>,
}

impl FabricClient {
    /// Build a client from configuration.
    pub fn new(config: &FabricConfig) -> Result<Self, FabricError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            workspace_id: config.workspace_id.clone(),
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: &str, path: &str, request: RequestBuilder) -> Result<ApiResponse, FabricError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        debug!(method, path, "Sending Fabric API request");
        let response = request.send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;
        debug!(method, path, status = status.as_u16(), "Fabric API responded");

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            headers,
            body,
        })
    }
}

fn with_body(request: RequestBuilder, body: RequestBody) -> Result<RequestBuilder, FabricError> {
    Ok(match body {
        RequestBody::Empty => request,
        RequestBody::Json(json) => request.json(&json),
        RequestBody::Binary {
            content_type,
            bytes,
        } => request
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes),
        RequestBody::Multipart(parts) => {
            let mut form = Form::new();
            for part in parts {
                form = match part {
                    FormPart::Text { name, value } => form.text(name, value),
                    FormPart::File {
                        name,
                        file_name,
                        content_type,
                        bytes,
                    } => form.part(
                        name,
                        Part::bytes(bytes)
                            .file_name(file_name)
                            .mime_str(&content_type)?,
                    ),
                };
            }
            request.multipart(form)
        }
    })
}

#[async_trait]
impl FabricApi for FabricClient {
    async fn get(&self, path: &str) -> Result<ApiResponse, FabricError> {
        self.send("GET", path, self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<ApiResponse, FabricError> {
        let request = with_body(self.client.post(self.url(path)), body)?;
        self.send("POST", path, request).await
    }

    async fn patch(&self, path: &str, body: RequestBody) -> Result<ApiResponse, FabricError> {
        let request = with_body(self.client.patch(self.url(path)), body)?;
        self.send("PATCH", path, request).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, FabricError> {
        self.send("DELETE", path, self.client.delete(self.url(path)))
            .await
    }

    fn semantic_models_path(&self) -> String {
        match &self.workspace_id {
            Some(workspace) => format!("/v1.0/myorg/groups/{}/semanticModels", workspace),
            None => "/v1.0/myorg/semanticModels".to_string(),
        }
    }
}

impl fmt::Debug for FabricClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FabricClient")
            .field("base_url", &self.base_url)
            .field("workspace_id", &self.workspace_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
