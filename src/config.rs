//! Server configuration.
//!
//! The binary fills these from CLI flags and environment variables; the
//! library never reads the environment itself.

use std::fmt;
use std::path::PathBuf;

/// Default Fabric / Power BI REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.powerbi.com";

/// Default validator executable, resolved through `PATH`.
pub const DEFAULT_VALIDATOR: &str = "pbi-tools";

/// Connection settings for the Fabric REST API.
#[derive(Clone)]
pub struct FabricConfig {
    /// Base URL every request path is resolved against.
    pub api_url: String,
    /// Pre-acquired bearer token attached to every request.
    pub access_token: Option<String>,
    /// Workspace (group) new models are created in. `None` targets "My workspace".
    pub workspace_id: Option<String>,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            workspace_id: None,
        }
    }
}

impl fmt::Debug for FabricConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FabricConfig")
            .field("api_url", &self.api_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("workspace_id", &self.workspace_id)
            .finish()
    }
}

/// How the external TMDL validator is invoked.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Executable to run.
    pub program: PathBuf,
    /// Arguments placed before `validate <dir>`.
    pub args: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_VALIDATOR),
            args: Vec::new(),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Remote API settings.
    pub fabric: FabricConfig,
    /// Validator settings.
    pub validator: ValidatorConfig,
}
