//! External tool probes.
//!
//! A probe answers "is executable X usable on this host?" by locating it on
//! PATH and running its version flag. Results are cached for the lifetime of
//! the registry (one process run).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;

use crate::error::{CrossenvError, Result};
use crate::platform::{HostOs, HostPlatform};
use crate::services::{CommandSpec, ProcessRunner};

#[derive(Debug, Clone)]
pub struct ToolProbe {
    pub name: String,
    /// Operating systems the tool is expected on. Empty means all.
    pub platforms: Vec<HostOs>,
    pub optional: bool,
    pub not_found_message: String,
    pub version_args: Vec<String>,
}

impl ToolProbe {
    pub fn new(name: impl Into<String>, not_found_message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platforms: Vec::new(),
            optional: false,
            not_found_message: not_found_message.into(),
            version_args: vec!["--version".to_string()],
        }
    }

    pub fn on(mut self, platforms: &[HostOs]) -> Self {
        self.platforms = platforms.to_vec();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn version_args(mut self, args: &[&str]) -> Self {
        self.version_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn applies_to(&self, os: HostOs) -> bool {
        self.platforms.is_empty() || self.platforms.contains(&os)
    }

    /// Never fails: any lookup or spawn error counts as "not available".
    pub async fn exists(&self, process: &dyn ProcessRunner) -> bool {
        let path = match which::which(&self.name) {
            Ok(path) => path,
            Err(_) => {
                tracing::debug!("{} not found on PATH", self.name);
                return false;
            }
        };

        let spec = CommandSpec::new(path.display().to_string()).args(self.version_args.clone());
        match process.output(&spec).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!("Version probe for {} failed: {}", self.name, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolProbeResult {
    pub tool_name: String,
    pub available: bool,
}

/// Registered probes plus a per-run result cache.
///
/// Shared behind an `Arc` between plugins and SDK managers, so registration
/// goes through `&self`.
pub struct ProbeRegistry {
    probes: RwLock<BTreeMap<String, ToolProbe>>,
    cache: Mutex<HashMap<String, bool>>,
    process: Arc<dyn ProcessRunner>,
    host: HostPlatform,
}

impl ProbeRegistry {
    pub fn new(process: Arc<dyn ProcessRunner>, host: HostPlatform) -> Self {
        Self {
            probes: RwLock::new(BTreeMap::new()),
            cache: Mutex::new(HashMap::new()),
            process,
            host,
        }
    }

    pub fn host(&self) -> HostPlatform {
        self.host
    }

    /// Registers a probe, replacing any probe with the same tool name.
    pub fn register(&self, probe: ToolProbe) {
        self.cache().remove(&probe.name);
        self.probes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(probe.name.clone(), probe);
    }

    pub fn get(&self, name: &str) -> Option<ToolProbe> {
        self.probes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Snapshot of all registered probes, sorted by name.
    pub fn probes(&self) -> Vec<ToolProbe> {
        self.probes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Probes for `name`, registered or not, caching the answer.
    pub async fn check(&self, name: &str) -> ToolProbeResult {
        if let Some(available) = self.cached(name) {
            return ToolProbeResult {
                tool_name: name.to_string(),
                available,
            };
        }

        let probe = self
            .get(name)
            .unwrap_or_else(|| ToolProbe::new(name, ""));

        let available = probe.applies_to(self.host.os) && probe.exists(self.process.as_ref()).await;

        self.cache().insert(name.to_string(), available);

        ToolProbeResult {
            tool_name: name.to_string(),
            available,
        }
    }

    /// Fails with `MissingTool` unless `name` is available.
    pub async fn require(&self, name: &str, purpose: &str) -> Result<()> {
        if self.check(name).await.available {
            return Ok(());
        }

        let hint = self
            .get(name)
            .map(|p| p.not_found_message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("install '{}' and make sure it is on PATH", name));

        Err(CrossenvError::missing_tool(name, purpose, hint))
    }

    /// Checks every probe that applies to this host.
    pub async fn check_all(&self) -> Vec<(ToolProbe, ToolProbeResult)> {
        let mut results = Vec::new();
        for probe in self.probes() {
            if !probe.applies_to(self.host.os) {
                continue;
            }
            let result = self.check(&probe.name).await;
            results.push((probe, result));
        }
        results
    }

    fn cached(&self, name: &str) -> Option<bool> {
        self.cache().get(name).copied()
    }

    // Poisoning is ignored: entries are plain values.
    fn cache(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
