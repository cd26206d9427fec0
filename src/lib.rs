//! # semantic-model-mcp
//!
//! MCP (Model Context Protocol) server for managing Fabric semantic models.
//!
//! This crate exposes semantic model operations as tools for AI agents. It implements
//! the MCP protocol over stdin/stdout using JSON-RPC 2.0.
//!
//! ## 5 Tools
//!
//! `createSemanticModel`, `updateSemanticModel`, `refreshSemanticModel`,
//! `deploySemanticModel`, `validateTmdl`
//!
//! Model definitions travel as TMDL file maps (relative path → content). Create and
//! update pack them into a zip archive; validation runs an external validator
//! (`pbi-tools` by default) over a scratch copy of the files.
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "semantic-models": {
//!       "command": "/path/to/semantic-model-mcp",
//!       "args": ["--workspace-id", "00000000-0000-0000-0000-000000000000"],
//!       "env": { "FABRIC_ACCESS_TOKEN": "..." }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can build the registry from your own collaborators:
//!
//! ```no_run
//! use std::sync::Arc;
//! use semantic_model_mcp::{FabricClient, FabricConfig, McpServer, PbiToolsValidator, ToolRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let fabric = Arc::new(FabricClient::new(&FabricConfig::default())?);
//! let validator = Arc::new(PbiToolsValidator::new("pbi-tools"));
//! let server = McpServer::new(ToolRegistry::semantic_model_tools(fabric, validator));
//!
//! // Reads from stdin, writes to stdout
//! server.run_stdio().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod config;
mod convert;
mod error;
pub mod fabric;
pub mod models;
mod server;
pub mod tools;
pub mod validator;

pub use archive::ArchiveError;
pub use config::{Config, FabricConfig, ValidatorConfig};
pub use error::{BoxError, ErrorCode, McpError, Result};
pub use fabric::{ApiResponse, FabricApi, FabricClient, FabricError, FailureKind, FormPart, RequestBody};
pub use models::{OperationStatus, TmdlFiles, ValidationError, ValidationResult};
pub use server::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, PROTOCOL_VERSION, SERVER_NAME};
pub use tools::{Tool, ToolDef, ToolRegistry};
pub use validator::{PbiToolsValidator, TmdlValidator, ValidatorError};
