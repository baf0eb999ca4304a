use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by crossenv commands.
///
/// Every variant aborts the current command. Configuration validation is the
/// one place where problems are returned as data instead (see
/// [`crate::configs::Validation`]).
#[derive(Error, Debug)]
pub enum CrossenvError {
    /// Bad or missing subcommand/arguments
    #[error("{message}\n  hint: {hint}")]
    Usage { message: String, hint: String },

    #[error("{sdk} is already installed. Run 'crossenv sdk {command} uninstall' first.")]
    AlreadyInstalled { sdk: String, command: String },

    #[error("{sdk} is not installed. Run 'crossenv sdk {command} install' first.")]
    NotInstalled { sdk: String, command: String },

    #[error("'{tool}' is required to {purpose} but was not found on PATH.\n  hint: {hint}")]
    MissingTool {
        tool: String,
        purpose: String,
        hint: String,
    },

    #[error("Download of {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Failed to extract {}: {message}", .archive.display())]
    Extraction { archive: PathBuf, message: String },

    #[error("'{program}' exited with code {code}")]
    SubprocessExit { program: String, code: i32 },

    #[error("Runner '{runner}' exited with code {code}")]
    RunnerExecution { runner: String, code: i32 },

    #[error("Unknown configuration '{name}'. Run 'crossenv configs --all' to list them.")]
    UnknownConfig { name: String },

    #[error("Unknown runner '{name}'. The plugin that declares it is not loaded.")]
    UnknownRunner { name: String },

    #[error("Configuration '{name}' inherits from '{base}', which is not registered yet")]
    UnknownBase { name: String, base: String },

    #[error("Unknown SDK command '{name}'. Available: {}", .available.join(", "))]
    UnknownPlugin {
        name: String,
        available: Vec<String>,
    },

    /// The configuration's validation failed; `hints` say how to fix it
    #[error("Configuration '{name}' is not usable:\n  {}", .hints.join("\n  "))]
    InvalidConfig { name: String, hints: Vec<String> },

    #[error("Configuration '{name}' does not define '{field}'")]
    IncompleteConfig { name: String, field: String },

    #[error("Required build file not found: {}", .path.display())]
    MissingBuildFile { path: PathBuf },

    #[error("{what} is not available for {platform}")]
    UnsupportedPlatform { what: String, platform: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CrossenvError {
    pub fn usage(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn missing_tool(
        tool: impl Into<String>,
        purpose: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            purpose: purpose.into(),
            hint: hint.into(),
        }
    }

    /// Process exit code the binary should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } => 2,
            Self::SubprocessExit { code, .. } | Self::RunnerExecution { code, .. } if *code != 0 => {
                *code
            }
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CrossenvError>;
