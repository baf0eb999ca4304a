//! Project configuration from crossenv.yaml
//!
//! Declares per-project configurations (derived from the ones plugins
//! register) and the typed option bags each plugin reads while building.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::configs::{BuildMode, ConfigDescriptor, Generator, Opener, Variable};
use crate::error::{CrossenvError, Result};
use crate::plugin::emscripten::EmscriptenOptions;
use crate::plugin::wasi::WasiOptions;

pub const PROJECT_FILE: &str = "crossenv.yaml";

/// Main project configuration loaded from crossenv.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Build output directory, relative to the project root
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Project configurations, registered after every plugin's
    #[serde(default)]
    pub configs: Vec<ProjectConfigEntry>,

    #[serde(default)]
    pub wasi: WasiOptions,

    #[serde(default)]
    pub emscripten: EmscriptenOptions,
}

fn default_build_dir() -> String {
    "build".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            configs: Vec::new(),
            wasi: WasiOptions::default(),
            emscripten: EmscriptenOptions::default(),
        }
    }
}

/// A configuration declared by the project.
///
/// Reusing a plugin configuration's name replaces it for this project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfigEntry {
    pub name: String,
    /// Configuration to derive from
    pub inherits: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<Generator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_mode: Option<BuildMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener: Option<Opener>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
}

impl ProjectConfigEntry {
    pub fn to_descriptor(&self) -> ConfigDescriptor {
        let mut descriptor = ConfigDescriptor::derive(&self.name, &self.inherits);
        descriptor.generator = self.generator;
        descriptor.build_mode = self.build_mode;
        descriptor.opener = self.opener;
        descriptor.runner = self.runner.clone();
        descriptor.variables = self
            .variables
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Variable::Text(s) => Variable::Text(resolve_env_value(s)),
                    other => other.clone(),
                };
                (k.clone(), value)
            })
            .collect();
        descriptor
    }
}

impl ProjectConfig {
    /// Look for crossenv.yaml in `start` or its parent directories
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Load project configuration from a path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CrossenvError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: ProjectConfig = serde_yaml::from_str(&content)
            .map_err(|e| CrossenvError::Config(format!("Invalid {}: {}", PROJECT_FILE, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks option values serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.wasi.validate()?;
        self.emscripten.validate()?;

        let mut seen = std::collections::HashSet::new();
        for entry in &self.configs {
            if !seen.insert(entry.name.as_str()) {
                return Err(CrossenvError::Config(format!(
                    "configuration '{}' is declared twice in {}",
                    entry.name, PROJECT_FILE
                )));
            }
        }
        Ok(())
    }
}

/// A project on disk: where it lives and what it declares.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Finds the project enclosing `dir`; a directory without crossenv.yaml
    /// is a project with default settings.
    pub fn discover(dir: &Path) -> Result<Self> {
        match ProjectConfig::discover(dir) {
            Some(path) => {
                let root = path.parent().unwrap_or(dir).to_path_buf();
                Ok(Self::new(root, ProjectConfig::load(&path)?))
            }
            None => Ok(Self::new(dir, ProjectConfig::default())),
        }
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.config.build_dir)
    }

    /// Build tree of one configuration.
    pub fn config_build_dir(&self, config_name: &str) -> PathBuf {
        self.build_dir().join(config_name)
    }
}

static ENV_REF: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env reference pattern is valid")
});

/// Resolve environment variable references ($VAR, ${VAR}, ${VAR:-default})
fn resolve_env_value(value: &str) -> String {
    ENV_REF
        .replace_all(value, |caps: &regex_lite::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}
