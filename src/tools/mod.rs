//! Tool registry and dispatch.
//!
//! Exposes 5 semantic model tools. Each tool validates its arguments before
//! touching the Fabric API or the validator, and reports every failure as an
//! [`McpError`].
//!
//! The registry is an explicit name → handler map built once at startup.

pub mod create;
pub mod deploy;
pub mod refresh;
pub mod update;
pub mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::config::Config;
use crate::error::{McpError, Result};
use crate::fabric::{FabricApi, FabricClient, FabricError};
use crate::validator::{PbiToolsValidator, TmdlValidator};

pub use create::CreateSemanticModelTool;
pub use deploy::DeploySemanticModelTool;
pub use refresh::RefreshSemanticModelTool;
pub use update::UpdateSemanticModelTool;
pub use validate::ValidateTmdlTool;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "createSemanticModel")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition advertised in tools/list.
    fn definition(&self) -> ToolDef;

    /// Run the tool on a raw argument object.
    async fn call(&self, args: Map<String, JsonValue>) -> Result<JsonValue>;
}

/// Registry of available MCP tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the 5 semantic model tools.
    pub fn semantic_model_tools(
        fabric: Arc<dyn FabricApi>,
        validator: Arc<dyn TmdlValidator>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(CreateSemanticModelTool::new(fabric.clone()));
        registry.register(UpdateSemanticModelTool::new(fabric.clone()));
        registry.register(RefreshSemanticModelTool::new(fabric.clone()));
        registry.register(DeploySemanticModelTool::new(fabric));
        registry.register(ValidateTmdlTool::new(validator));
        registry
    }

    /// Build the production registry: a shared [`FabricClient`] and a
    /// [`PbiToolsValidator`].
    pub fn from_config(config: &Config) -> std::result::Result<Self, FabricError> {
        let fabric = Arc::new(FabricClient::new(&config.fabric)?);
        let validator = Arc::new(PbiToolsValidator::from_config(&config.validator));
        Ok(Self::semantic_model_tools(fabric, validator))
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.definition().name;
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get all tool definitions, ordered by name.
    pub fn tools(&self) -> Vec<ToolDef> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Dispatch a tool call to the appropriate handler.
    pub async fn dispatch(&self, name: &str, args: Map<String, JsonValue>) -> Result<JsonValue> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| McpError::method_not_found(format!("Unknown tool: {}", name)))?;
        tool.call(args).await
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@type $req_type));)*
        $(props.insert($opt_name.to_string(), schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only required properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@type $req_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type file_map) => {
        serde_json::json!({
            "type": "object",
            "description": "Relative TMDL file path mapped to file content",
            "additionalProperties": {"type": "string"},
            "minProperties": 1
        })
    };
}
