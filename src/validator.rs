//! External TMDL validation.
//!
//! [`PbiToolsValidator`] writes the submitted files into a private scratch
//! directory, runs `<program> validate <dir>` and turns the textual output
//! into a [`ValidationResult`]. The scratch directory is unique per call and
//! removed on every exit path.
//!
//! A validator that cannot be started, or that exits unsuccessfully, yields an
//! invalid result with a single synthetic finding rather than an error. Only
//! failures to prepare the scratch directory are returned as [`ValidatorError`].

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ValidatorConfig;
use crate::models::{TmdlFiles, ValidationError, ValidationResult};

/// Failures of the adapter itself.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The scratch directory could not be created or written.
    #[error("failed to prepare validation workspace: {0}")]
    Workspace(#[from] std::io::Error),
    /// A file key would resolve outside the scratch directory.
    #[error("file path '{0}' must be relative and stay inside the model folder")]
    UnsafePath(String),
}

/// Validates a set of TMDL files.
#[async_trait]
pub trait TmdlValidator: Send + Sync {
    /// Validate `files`. Validation findings are data; only adapter failures are errors.
    async fn validate(&self, files: &TmdlFiles) -> Result<ValidationResult, ValidatorError>;
}

/// Runs `pbi-tools validate` (or a compatible executable) as a subprocess.
#[derive(Debug, Clone)]
pub struct PbiToolsValidator {
    program: PathBuf,
    args: Vec<String>,
}

impl PbiToolsValidator {
    /// Validator running `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Validator from configuration.
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(config.program.clone()).with_args(config.args.clone())
    }

    /// Arguments placed before `validate <dir>`.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    async fn run(&self, dir: &Path) -> std::result::Result<String, String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("validate")
            .arg(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to start {}: {}", self.program.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "Error running command ({}): {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TmdlValidator for PbiToolsValidator {
    async fn validate(&self, files: &TmdlFiles) -> Result<ValidationResult, ValidatorError> {
        let workspace = tempfile::Builder::new()
            .prefix("tmdl-validate-")
            .tempdir()?;
        debug!(dir = %workspace.path().display(), files = files.len(), "Prepared validation workspace");

        write_workspace(workspace.path(), files).await?;

        let result = match self.run(workspace.path()).await {
            Ok(output) => parse_output(&output, workspace.path(), files.len()),
            Err(reason) => {
                warn!(%reason, "Validator did not complete");
                execution_failure(&reason)
            }
        };

        let dir = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!(dir = %dir.display(), error = %e, "Failed to delete validation workspace");
        }

        info!(
            valid = result.is_valid,
            errors = result.errors.len(),
            "TMDL validation finished"
        );
        Ok(result)
    }
}

async fn write_workspace(root: &Path, files: &TmdlFiles) -> Result<(), ValidatorError> {
    for (name, content) in files {
        let relative = checked_relative(name)?;
        let full = root.join(relative);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, content).await?;
    }
    Ok(())
}

fn checked_relative(name: &str) -> Result<&Path, ValidatorError> {
    let path = Path::new(name);
    let has_file = path
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if !has_file || escapes {
        return Err(ValidatorError::UnsafePath(name.to_string()));
    }
    Ok(path)
}

fn execution_failure(reason: &str) -> ValidationResult {
    ValidationResult {
        is_valid: false,
        errors: vec![ValidationError::message(format!(
            "Validation process error: {}",
            reason
        ))],
        summary: Some("Validation could not be completed.".to_string()),
    }
}

fn indicates_error(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("error") || lower.contains("failed")
}

/// Turn validator output into a result. File names under `root` are reported
/// relative to it.
pub(crate) fn parse_output(output: &str, root: &Path, file_count: usize) -> ValidationResult {
    let errors: Vec<ValidationError> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && indicates_error(line))
        .map(|line| parse_diagnostic(line, root))
        .collect();

    let summary = if errors.is_empty() {
        format!("Validation succeeded for {} file(s).", file_count)
    } else {
        format!(
            "Validation found {} error(s) in {} file(s).",
            errors.len(),
            file_count
        )
    };

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        summary: Some(summary),
    }
}

/// Parse one finding. Recognizes `file(line,col): severity CODE: message` and
/// `file:line:col: severity CODE: message`; anything else becomes a bare message.
pub(crate) fn parse_diagnostic(line: &str, root: &Path) -> ValidationError {
    let located = split_paren_location(line).or_else(|| split_colon_location(line));
    let Some((file, line_number, column, rest)) = located else {
        return ValidationError::message(line);
    };

    let (severity, error_code, message) = split_severity_and_code(rest);
    ValidationError {
        file_name: Some(relative_name(file.trim(), root)),
        line_number,
        column,
        message,
        error_code,
        severity,
    }
}

fn split_paren_location(line: &str) -> Option<(&str, u32, u32, &str)> {
    let open = line.find('(')?;
    let close = open + line[open..].find("):")?;
    let (row, col) = line[open + 1..close].split_once(',')?;
    let row = row.trim().parse().ok()?;
    let col = col.trim().parse().ok()?;
    let file = &line[..open];
    if file.trim().is_empty() {
        return None;
    }
    Some((file, row, col, &line[close + 2..]))
}

fn split_colon_location(line: &str) -> Option<(&str, u32, u32, &str)> {
    for (idx, _) in line.match_indices(':') {
        let file = &line[..idx];
        if file.trim().is_empty() {
            continue;
        }
        let mut parts = line[idx + 1..].splitn(3, ':');
        if let (Some(row), Some(col), Some(rest)) = (parts.next(), parts.next(), parts.next()) {
            if let (Ok(row), Ok(col)) = (row.trim().parse(), col.trim().parse()) {
                return Some((file, row, col, rest));
            }
        }
    }
    None
}

fn split_severity_and_code(rest: &str) -> (String, Option<String>, String) {
    let rest = rest.trim();
    let (word, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let bare_word = word.trim_end_matches(':');
    let severity = match bare_word.to_ascii_lowercase().as_str() {
        "error" => "Error",
        "warning" => "Warning",
        "info" => "Info",
        _ => return ("Error".to_string(), None, rest.to_string()),
    };

    // "error: message" carries no code
    if word.ends_with(':') {
        return (severity.to_string(), None, tail.trim().to_string());
    }

    match tail.split_once(':') {
        Some((code, message)) if !code.trim().is_empty() && !code.trim().contains(' ') => (
            severity.to_string(),
            Some(code.trim().to_string()),
            message.trim().to_string(),
        ),
        _ => (severity.to_string(), None, tail.trim().to_string()),
    }
}

fn relative_name(file: &str, root: &Path) -> String {
    Path::new(file)
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file.to_string())
}
