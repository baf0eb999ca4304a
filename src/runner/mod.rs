//! Running built artifacts.
//!
//! A configuration names its runner; [`RunnerDispatch`] maps that name to a
//! backend:
//!
//! - [`DirectRunner`]: spawn the artifact, or a runtime (wasmtime) with the
//!   artifact as its first argument
//! - [`BrowserRunner`]: serve the build output over HTTP and open a browser
//! - [`HarnessRunner`]: hand the artifact to a launcher (emrun, ios-sim)

pub mod browser;
pub mod direct;
pub mod harness;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::configs::ConfigurationRecord;
use crate::error::{CrossenvError, Result};
use crate::project_config::Project;

pub use browser::BrowserRunner;
pub use direct::DirectRunner;
pub use harness::{HarnessRunner, Launcher};

/// Caller-supplied part of a run, passed through to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Appended after whatever the runner puts first (usually the artifact).
    pub args: Vec<String>,
    /// Defaults to the project root.
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl RunOptions {
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Executable,
    Library,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executable => write!(f, "executable"),
            Self::Library => write!(f, "library"),
        }
    }
}

/// A built artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// Used as given; relative paths resolve against the run directory.
    pub artifact: PathBuf,
}

impl Target {
    pub fn executable(artifact: impl Into<PathBuf>) -> Self {
        let artifact = artifact.into();
        let name = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            kind: TargetKind::Executable,
            artifact,
        }
    }

    /// Directory holding the artifact.
    pub fn dir(&self) -> &Path {
        match self.artifact.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn file_name(&self) -> String {
        self.artifact
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Everything a runner gets for one run.
pub struct Invocation<'a> {
    pub project: &'a Project,
    pub config: &'a ConfigurationRecord,
    pub target: &'a Target,
    pub options: &'a RunOptions,
}

impl Invocation<'_> {
    pub fn cwd(&self) -> PathBuf {
        self.options
            .cwd
            .clone()
            .unwrap_or_else(|| self.project.root.clone())
    }
}

#[async_trait]
pub trait Runner: Send + Sync {
    /// Blocks until the backend is done. A nonzero exit is a
    /// `RunnerExecution` error.
    async fn run(&self, invocation: &Invocation<'_>) -> Result<()>;
}

/// Maps a nonzero exit code to `RunnerExecution`.
pub(crate) fn check_exit(runner: &str, code: i32) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(CrossenvError::RunnerExecution {
            runner: runner.to_string(),
            code,
        })
    }
}

/// Runner table keyed by name.
#[derive(Default)]
pub struct RunnerDispatch {
    runners: HashMap<String, Arc<dyn Runner>>,
}

impl RunnerDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier binding.
    pub fn register(&mut self, name: impl Into<String>, runner: Arc<dyn Runner>) {
        let name = name.into();
        if self.runners.insert(name.clone(), runner).is_some() {
            tracing::debug!("Runner '{}' replaced", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.runners.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.runners.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn run(
        &self,
        name: &str,
        project: &Project,
        config: &ConfigurationRecord,
        target: &Target,
        options: &RunOptions,
    ) -> Result<()> {
        let runner = self
            .runners
            .get(name)
            .ok_or_else(|| CrossenvError::UnknownRunner {
                name: name.to_string(),
            })?;

        tracing::info!(
            runner = name,
            config = %config.name,
            artifact = %target.artifact.display(),
            "Running artifact"
        );

        runner
            .run(&Invocation {
                project,
                config,
                target,
                options,
            })
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::configs::{ConfigDescriptor, TargetPlatform};
    use crate::project_config::ProjectConfig;
    use crate::services::testing::RecordingProcess;
    use crate::services::{CommandSpec, ProcessRunner};

    pub(crate) fn project() -> Project {
        Project::new("/work/app", ProjectConfig::default())
    }

    pub(crate) fn record(runner: &str) -> ConfigurationRecord {
        ConfigDescriptor::new("native")
            .platform(TargetPlatform::Native)
            .runner(runner)
            .resolve(None)
            .unwrap()
    }

    struct SpawningRunner(Arc<RecordingProcess>);

    #[async_trait]
    impl Runner for SpawningRunner {
        async fn run(&self, invocation: &Invocation<'_>) -> Result<()> {
            let spec = CommandSpec::new(invocation.target.artifact.display().to_string());
            let code = self.0.run(&spec).await?;
            check_exit("spawning", code)
        }
    }

    #[tokio::test]
    async fn test_unknown_runner_spawns_nothing() {
        let process = Arc::new(RecordingProcess::new());
        let mut dispatch = RunnerDispatch::new();
        dispatch.register("native", Arc::new(SpawningRunner(process.clone())));

        let err = dispatch
            .run(
                "unknownRunner",
                &project(),
                &record("unknownRunner"),
                &Target::executable("out/app.bin"),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CrossenvError::UnknownRunner { ref name } if name == "unknownRunner"));
        assert!(process.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reregistration_replaces() {
        let first = Arc::new(RecordingProcess::new());
        let second = Arc::new(RecordingProcess::new());
        let mut dispatch = RunnerDispatch::new();
        dispatch.register("native", Arc::new(SpawningRunner(first.clone())));
        dispatch.register("native", Arc::new(SpawningRunner(second.clone())));

        dispatch
            .run(
                "native",
                &project(),
                &record("native"),
                &Target::executable("out/app.bin"),
                &RunOptions::default(),
            )
            .await
            .unwrap();

        assert!(first.calls().is_empty());
        assert_eq!(second.calls().len(), 1);
        assert_eq!(dispatch.names(), vec!["native"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_runner_error() {
        let process = Arc::new(RecordingProcess::with_exit_code(7));
        let mut dispatch = RunnerDispatch::new();
        dispatch.register("native", Arc::new(SpawningRunner(process)));

        let err = dispatch
            .run(
                "native",
                &project(),
                &record("native"),
                &Target::executable("out/app.bin"),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CrossenvError::RunnerExecution { code: 7, .. }));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_target_paths() {
        let target = Target::executable("build/wasi/app.html");
        assert_eq!(target.name, "app");
        assert_eq!(target.dir(), Path::new("build/wasi"));
        assert_eq!(target.file_name(), "app.html");

        let bare = Target::executable("app.wasm");
        assert_eq!(bare.dir(), Path::new("."));
    }
}
