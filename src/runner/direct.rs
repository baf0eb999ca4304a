use std::sync::Arc;

use async_trait::async_trait;

use super::{check_exit, Invocation, Runner};
use crate::error::Result;
use crate::probe::ProbeRegistry;
use crate::services::{CommandSpec, ProcessRunner};

/// Spawns the artifact itself, or a runtime with the artifact as its first
/// argument: `[runtime_args.., artifact, options.args..]`.
pub struct DirectRunner {
    name: String,
    runtime: Option<String>,
    runtime_args: Vec<String>,
    probes: Arc<ProbeRegistry>,
    process: Arc<dyn ProcessRunner>,
}

impl DirectRunner {
    /// Runs native executables as-is.
    pub fn native(probes: Arc<ProbeRegistry>, process: Arc<dyn ProcessRunner>) -> Self {
        Self {
            name: "native".to_string(),
            runtime: None,
            runtime_args: Vec::new(),
            probes,
            process,
        }
    }

    /// Runs artifacts through `runtime`, which must be on PATH.
    pub fn with_runtime(
        runtime: impl Into<String>,
        probes: Arc<ProbeRegistry>,
        process: Arc<dyn ProcessRunner>,
    ) -> Self {
        let runtime = runtime.into();
        Self {
            name: runtime.clone(),
            runtime: Some(runtime),
            runtime_args: Vec::new(),
            probes,
            process,
        }
    }

    pub fn runtime_args(mut self, args: &[&str]) -> Self {
        self.runtime_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    fn command(&self, invocation: &Invocation<'_>) -> CommandSpec {
        let artifact = invocation.target.artifact.display().to_string();
        let spec = match self.runtime {
            Some(ref runtime) => CommandSpec::new(runtime)
                .args(self.runtime_args.clone())
                .arg(artifact),
            None => CommandSpec::new(artifact),
        };

        let mut spec = spec
            .args(invocation.options.args.clone())
            .cwd(invocation.cwd());
        for (key, value) in &invocation.options.env {
            spec = spec.env(key, value);
        }
        spec
    }
}

#[async_trait]
impl Runner for DirectRunner {
    async fn run(&self, invocation: &Invocation<'_>) -> Result<()> {
        if let Some(ref runtime) = self.runtime {
            self.probes
                .require(runtime, &format!("run {} artifacts", invocation.config.platform))
                .await?;
        }

        let spec = self.command(invocation);
        tracing::debug!("Spawning {}", spec.display());

        let code = self.process.run(&spec).await?;
        check_exit(&self.name, code)
    }
}
