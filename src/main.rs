//! semantic-model-mcp: MCP server for Fabric semantic models.
//!
//! Speaks JSON-RPC 2.0 on stdin/stdout; logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use semantic_model_mcp::config::{DEFAULT_API_URL, DEFAULT_VALIDATOR};
use semantic_model_mcp::{Config, FabricConfig, McpServer, ToolRegistry, ValidatorConfig};

#[derive(Debug, Parser)]
#[command(name = "semantic-model-mcp", version, about = "MCP server for Fabric semantic models")]
struct Cli {
    /// Base URL of the Fabric / Power BI REST API.
    #[arg(long, env = "FABRIC_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Workspace (group) id new models are created in.
    #[arg(long, env = "FABRIC_WORKSPACE_ID")]
    workspace_id: Option<String>,

    /// Bearer token attached to every API request.
    #[arg(long, env = "FABRIC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// TMDL validator executable.
    #[arg(long, env = "PBI_TOOLS_PATH", default_value = DEFAULT_VALIDATOR)]
    validator: PathBuf,

    /// Log filter, e.g. "info" or "semantic_model_mcp=debug".
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Print the tool definitions to stderr and exit.
    #[arg(long)]
    diagnostics_only: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            fabric: FabricConfig {
                api_url: self.api_url.clone(),
                access_token: self.access_token.clone(),
                workspace_id: self.workspace_id.clone(),
            },
            validator: ValidatorConfig {
                program: self.validator.clone(),
                args: Vec::new(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries protocol traffic only
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    let config = cli.config();
    if config.fabric.access_token.is_none() {
        tracing::warn!("No access token configured; Fabric API calls will be unauthenticated");
    }
    let registry = ToolRegistry::from_config(&config)?;

    if cli.diagnostics_only {
        for tool in registry.tools() {
            tracing::info!(tool = %tool.name, schema = %tool.input_schema, "Registered tool");
        }
        return Ok(());
    }

    tracing::info!(
        api_url = %config.fabric.api_url,
        workspace_id = config.fabric.workspace_id.as_deref().unwrap_or("me"),
        validator = %config.validator.program.display(),
        "Starting semantic model MCP server"
    );
    McpServer::new(registry).run_stdio().await?;
    Ok(())
}
