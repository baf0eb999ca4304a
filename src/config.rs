use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CrossenvError, Result};

/// User-level settings, `~/.config/crossenv/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared root holding one directory per SDK
    #[serde(default = "default_sdk_root")]
    pub sdk_root: String,
    /// Port of the browser runner's file server
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Browser executable to use instead of the system default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    /// Version installed when `install` is given none, per SDK name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_versions: BTreeMap<String, String>,
}

fn default_sdk_root() -> String {
    "~/.crossenv/sdks".to_string()
}

fn default_server_port() -> u16 {
    6931
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sdk_root: default_sdk_root(),
            server_port: default_server_port(),
            browser: None,
            default_versions: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CrossenvError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(".config").join("crossenv"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Loads the user config; a missing file means defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| CrossenvError::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// `CROSSENV_SDK_ROOT` and `CROSSENV_BROWSER` win over the file.
    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("CROSSENV_SDK_ROOT") {
            if !root.is_empty() {
                self.sdk_root = root;
            }
        }

        if let Ok(browser) = std::env::var("CROSSENV_BROWSER") {
            if !browser.is_empty() {
                self.browser = Some(browser);
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| CrossenvError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sdk_root.trim().is_empty() {
            return Err(CrossenvError::Config("sdk_root must not be empty".to_string()));
        }

        if self.server_port == 0 {
            return Err(CrossenvError::Config(
                "server_port must be a fixed port, not 0".to_string(),
            ));
        }

        Ok(())
    }

    /// `sdk_root` with `~` and environment variables expanded.
    pub fn sdk_root(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.sdk_root)
            .map_err(|e| CrossenvError::Config(format!("Invalid sdk_root '{}': {}", self.sdk_root, e)))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub fn default_version(&self, sdk: &str) -> Option<&str> {
        self.default_versions.get(sdk).map(String::as_str)
    }

    /// Sets one key from its string form, as `crossenv config set` does.
    ///
    /// `default_versions.<sdk>` addresses a single SDK; an empty value clears
    /// optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "sdk_root" => self.sdk_root = value.to_string(),
            "server_port" => {
                self.server_port = value.parse().map_err(|_| {
                    CrossenvError::Config(format!("Invalid server_port '{}': expected a port number", value))
                })?;
            }
            "browser" => {
                self.browser = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {
                let Some(sdk) = key.strip_prefix("default_versions.") else {
                    return Err(CrossenvError::usage(
                        format!("Unknown config key '{}'", key),
                        "valid keys: sdk_root, server_port, browser, default_versions.<sdk>",
                    ));
                };
                if value.is_empty() {
                    self.default_versions.remove(sdk);
                } else {
                    self.default_versions.insert(sdk.to_string(), value.to_string());
                }
            }
        }

        self.validate()
    }
}
