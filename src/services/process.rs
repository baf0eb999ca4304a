use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;

use super::{CommandSpec, ProcessOutput, ProcessRunner};
use crate::error::Result;

/// Spawns real child processes with `tokio::process`.
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    fn command(spec: &CommandSpec) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<i32> {
        tracing::debug!("Running: {}", spec.display());

        let status = Self::command(spec)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("failed to start '{}'", spec.program))?;

        // Killed by a signal on unix
        Ok(status.code().unwrap_or(-1))
    }

    async fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        tracing::debug!("Running (captured): {}", spec.display());

        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to start '{}'", spec.program))?;

        Ok(ProcessOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
