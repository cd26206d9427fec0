//! MCP server: JSON-RPC 2.0 over newline-delimited stdin/stdout.
//!
//! Every request is handled on its own task and responses are written by a
//! single writer, so slow tool calls never block each other. Logging goes to
//! stderr; stdout carries protocol messages only.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{ErrorCode, McpError, Result};
use crate::tools::ToolRegistry;

/// Server name reported from `initialize`.
pub const SERVER_NAME: &str = "Semantic Model MCP Server";

/// Protocol version assumed when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0".
    pub jsonrpc: String,
    /// Request id; `None` only when the member is absent (a notification).
    /// An explicit `"id": null` is `Some(JsonValue::Null)`.
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<JsonValue>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
}

fn present_id<'de, D>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Extra diagnostic data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        Self {
            code: err.code().code(),
            message: err.message().to_string(),
            data: err
                .inner()
                .map(|inner| serde_json::json!({ "details": inner.to_string() })),
        }
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Id of the request being answered.
    pub id: JsonValue,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response.
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn error(id: JsonValue, err: &McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError::from(err)),
        }
    }

    /// Taxonomy code of the error, if this is an error response.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error
            .as_ref()
            .and_then(|err| ErrorCode::from_code(err.code))
    }
}

/// MCP server over a [`ToolRegistry`].
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a server for `registry`.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The tools this server exposes.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`.
    ///
    /// Returns after `reader` reaches EOF and every in-flight request has been answered.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!(tools = self.registry.tools().len(), "MCP server started");

        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut in_flight = JoinSet::new();
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        while reader.read_until(b'\n', &mut buf).await? > 0 {
            let line = match String::from_utf8(std::mem::take(&mut buf)) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Discarding message that is not valid UTF-8");
                    let err = McpError::parse_error(format!("Parse error: {}", e));
                    let _ = tx.send(JsonRpcResponse::error(JsonValue::Null, &err));
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let server = self.clone();
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    // Only fails once the writer is gone; nothing left to report to.
                    let _ = tx.send(response);
                }
            });
            // Reap finished tasks so the set stays small on long sessions.
            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        drop(tx);

        match writer_task.await {
            Ok(result) => result?,
            Err(e) => return Err(std::io::Error::new(std::io::ErrorKind::Other, e)),
        }
        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: JsonValue = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Discarding unparseable message");
                let err = McpError::parse_error(format!("Parse error: {}", e));
                return Some(JsonRpcResponse::error(JsonValue::Null, &err));
            }
        };

        let id = value.get("id").cloned().unwrap_or(JsonValue::Null);
        if !value.is_object() {
            let err = McpError::invalid_request("Invalid Request: expected a JSON-RPC request object");
            return Some(JsonRpcResponse::error(id, &err));
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let err = McpError::invalid_request(format!("Invalid Request: {}", e));
                return Some(JsonRpcResponse::error(id, &err));
            }
        };
        self.handle_request(request).await
    }

    /// Handle a decoded request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Received notification");
            return None;
        };

        if request.jsonrpc != "2.0" {
            let err = McpError::invalid_request(format!(
                "Invalid Request: unsupported jsonrpc version '{}'",
                request.jsonrpc
            ));
            return Some(JsonRpcResponse::error(id, &err));
        }

        debug!(method = %request.method, "Handling request");
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(serde_json::json!({ "tools": self.registry.tools() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(McpError::method_not_found(format!(
                "Method not found: {}",
                other
            ))),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                warn!(
                    method = %request.method,
                    code = err.code().name(),
                    error = %err,
                    "Request failed"
                );
                JsonRpcResponse::error(id, &err)
            }
        })
    }

    fn initialize(&self, params: Option<&JsonValue>) -> JsonValue {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(JsonValue::as_str)
            .unwrap_or(PROTOCOL_VERSION);

        serde_json::json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn call_tool(&self, params: Option<JsonValue>) -> Result<JsonValue> {
        let mut params = match params {
            Some(JsonValue::Object(map)) => map,
            Some(JsonValue::Null) | None => Map::new(),
            Some(_) => return Err(McpError::invalid_params("tools/call params must be an object")),
        };

        let name = match params.remove("name") {
            Some(JsonValue::String(name)) if !name.is_empty() => name,
            _ => return Err(McpError::invalid_params("Missing tool name")),
        };
        let args = match params.remove("arguments") {
            Some(JsonValue::Object(args)) => args,
            Some(JsonValue::Null) | None => Map::new(),
            Some(_) => return Err(McpError::invalid_params("Tool arguments must be an object")),
        };

        info!(tool = %name, "Calling tool");
        let value = self.registry.dispatch(&name, args).await?;
        let text = serde_json::to_string(&value)?;
        Ok(serde_json::json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": value,
            "isError": false
        }))
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut bytes = serde_json::to_vec(&response)?;
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }
    Ok(())
}
