//! Protocol error taxonomy.
//!
//! Every failure that leaves a tool handler is an [`McpError`] carrying exactly
//! one [`ErrorCode`]. Collaborator failures (HTTP, archive, subprocess) are kept
//! as the inner cause so they stay available to logs without leaking their
//! types across the RPC boundary.

use std::error::Error as StdError;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Boxed inner cause attached to an [`McpError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The five JSON-RPC error codes callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed JSON at the transport level.
    ParseError,
    /// The message is not a valid JSON-RPC request envelope.
    InvalidRequest,
    /// Unknown RPC method or tool name.
    MethodNotFound,
    /// A tool precondition failed (missing or empty required field).
    InvalidParams,
    /// Anything else: remote call, subprocess, or unexpected failure.
    InternalError,
}

impl ErrorCode {
    /// Numeric JSON-RPC code.
    pub const fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }

    /// Variant name, as used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "ParseError",
            ErrorCode::InvalidRequest => "InvalidRequest",
            ErrorCode::MethodNotFound => "MethodNotFound",
            ErrorCode::InvalidParams => "InvalidParams",
            ErrorCode::InternalError => "InternalError",
        }
    }

    /// Inverse of [`ErrorCode::code`].
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(ErrorCode::ParseError),
            -32600 => Some(ErrorCode::InvalidRequest),
            -32601 => Some(ErrorCode::MethodNotFound),
            -32602 => Some(ErrorCode::InvalidParams),
            -32603 => Some(ErrorCode::InternalError),
            _ => None,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

/// Error returned to MCP callers.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct McpError {
    code: ErrorCode,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl McpError {
    /// Create an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Malformed JSON on the wire.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    /// Malformed JSON-RPC envelope.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Unknown method or tool.
    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotFound, message)
    }

    /// Failed tool precondition.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// Failure while carrying out a tool call.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Attach the underlying failure.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Taxonomy code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message, including its operation-specific prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped collaborator failure, if any.
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::internal(format!("Failed to serialize response: {}", err)).with_source(err)
    }
}
