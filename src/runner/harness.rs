use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::{check_exit, Invocation, Runner};
use crate::error::{CrossenvError, Result};
use crate::probe::ProbeRegistry;
use crate::services::{CommandSpec, ProcessRunner};

/// Where a harness's launcher executable lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    /// Shipped inside an installed SDK.
    Bundled {
        path: PathBuf,
        sdk: String,
        /// SDK command that installs it.
        command: String,
    },
    /// A host tool found on PATH.
    OnPath(String),
}

/// Hands the artifact to a launcher (an emulator or page runner).
///
/// `args` are templates: `{dir}` is the artifact's directory, `{file}` its
/// file name and `{artifact}` the full path. Caller arguments follow.
pub struct HarnessRunner {
    name: String,
    launcher: Launcher,
    args: Vec<String>,
    probes: Arc<ProbeRegistry>,
    process: Arc<dyn ProcessRunner>,
}

impl HarnessRunner {
    pub fn new(
        name: impl Into<String>,
        launcher: Launcher,
        args: &[&str],
        probes: Arc<ProbeRegistry>,
        process: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            launcher,
            args: args.iter().map(|a| a.to_string()).collect(),
            probes,
            process,
        }
    }

    async fn program(&self) -> Result<String> {
        match self.launcher {
            Launcher::Bundled {
                ref path,
                ref sdk,
                ref command,
            } => {
                if !path.exists() {
                    return Err(CrossenvError::NotInstalled {
                        sdk: sdk.clone(),
                        command: command.clone(),
                    });
                }
                Ok(path.display().to_string())
            }
            Launcher::OnPath(ref tool) => {
                self.probes
                    .require(tool, &format!("run artifacts with {}", self.name))
                    .await?;
                Ok(tool.clone())
            }
        }
    }

    fn expand_args(&self, invocation: &Invocation<'_>) -> Vec<String> {
        let target = invocation.target;
        let dir = target.dir().display().to_string();
        let file = target.file_name();
        let artifact = target.artifact.display().to_string();

        self.args
            .iter()
            .map(|a| {
                a.replace("{dir}", &dir)
                    .replace("{file}", &file)
                    .replace("{artifact}", &artifact)
            })
            .chain(invocation.options.args.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl Runner for HarnessRunner {
    async fn run(&self, invocation: &Invocation<'_>) -> Result<()> {
        let program = self.program().await?;

        let mut spec = CommandSpec::new(program)
            .args(self.expand_args(invocation))
            .cwd(invocation.cwd());
        for (key, value) in &invocation.options.env {
            spec = spec.env(key, value);
        }

        tracing::debug!("Launching {}", spec.display());
        let code = self.process.run(&spec).await?;
        check_exit(&self.name, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HostArch, HostOs, HostPlatform};
    use crate::runner::tests::{project, record};
    use crate::runner::{RunOptions, Target};
    use crate::services::testing::RecordingProcess;

    fn probes() -> Arc<ProbeRegistry> {
        Arc::new(ProbeRegistry::new(
            Arc::new(RecordingProcess::new()),
            HostPlatform::new(HostOs::Linux, HostArch::X86_64),
        ))
    }

    #[tokio::test]
    async fn test_bundled_launcher_gets_dir_and_file() {
        let sdk = tempfile::tempdir().unwrap();
        let emrun = sdk.path().join("emrun");
        std::fs::write(&emrun, "").unwrap();

        let process = Arc::new(RecordingProcess::new());
        let runner = HarnessRunner::new(
            "emrun",
            Launcher::Bundled {
                path: emrun.clone(),
                sdk: "emsdk".to_string(),
                command: "emscripten".to_string(),
            },
            &["--serve_root", "{dir}", "{file}"],
            probes(),
            process.clone(),
        );

        let project = project();
        let config = record("emrun");
        let target = Target::executable("build/web/app.html");
        let options = RunOptions::with_args(["--verbose"]);

        runner
            .run(&Invocation {
                project: &project,
                config: &config,
                target: &target,
                options: &options,
            })
            .await
            .unwrap();

        let call = &process.calls()[0];
        assert_eq!(call.program, emrun.display().to_string());
        assert_eq!(
            call.args,
            vec!["--serve_root", "build/web", "app.html", "--verbose"]
        );
    }

    #[tokio::test]
    async fn test_bundled_launcher_requires_sdk() {
        let process = Arc::new(RecordingProcess::new());
        let runner = HarnessRunner::new(
            "emrun",
            Launcher::Bundled {
                path: PathBuf::from("/nonexistent/emsdk/upstream/emscripten/emrun"),
                sdk: "emsdk".to_string(),
                command: "emscripten".to_string(),
            },
            &["{file}"],
            probes(),
            process.clone(),
        );

        let project = project();
        let config = record("emrun");
        let target = Target::executable("app.html");

        let err = runner
            .run(&Invocation {
                project: &project,
                config: &config,
                target: &target,
                options: &RunOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("crossenv sdk emscripten install"));
        assert!(process.calls().is_empty());
    }

    #[tokio::test]
    async fn test_path_launcher_must_exist() {
        let process = Arc::new(RecordingProcess::new());
        let runner = HarnessRunner::new(
            "ios-sim",
            Launcher::OnPath("crossenv-no-such-sim".to_string()),
            &["launch", "{artifact}"],
            probes(),
            process.clone(),
        );

        let project = project();
        let config = record("ios-sim");
        let target = Target::executable("build/ios/App.app");

        let err = runner
            .run(&Invocation {
                project: &project,
                config: &config,
                target: &target,
                options: &RunOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CrossenvError::MissingTool { .. }));
        assert!(process.calls().is_empty());
    }
}
