use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandSpec, ProcessRunner, Vcs};
use crate::error::{CrossenvError, Result};

/// Git driven through the host `git` executable.
pub struct GitVcs {
    process: Arc<dyn ProcessRunner>,
}

impl GitVcs {
    pub fn new(process: Arc<dyn ProcessRunner>) -> Self {
        Self { process }
    }

    async fn git(&self, dir: Option<&Path>, args: &[&str]) -> Result<()> {
        let mut spec = CommandSpec::new("git");
        if let Some(dir) = dir {
            spec = spec.arg("-C").arg(dir.display().to_string());
        }
        let spec = spec.args(args.iter().copied());

        let code = self.process.run(&spec).await?;
        if code != 0 {
            return Err(CrossenvError::SubprocessExit {
                program: format!("git {}", args.first().copied().unwrap_or_default()),
                code,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Vcs for GitVcs {
    fn required_tool(&self) -> Option<&str> {
        Some("git")
    }

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("Cloning {} into {}", url, dest.display());
        self.git(None, &["clone", url, &dest.display().to_string()])
            .await
    }

    async fn update(&self, dir: &Path, url: &str) -> Result<()> {
        tracing::info!("Syncing {} with {}", dir.display(), url);
        self.git(Some(dir), &["remote", "set-url", "origin", url])
            .await?;
        self.git(Some(dir), &["fetch", "--prune", "origin"]).await?;
        self.git(Some(dir), &["remote", "set-head", "origin", "--auto"])
            .await?;
        self.git(Some(dir), &["reset", "--hard", "origin/HEAD"])
            .await
    }

    async fn checkout(&self, dir: &Path, reference: &str) -> Result<()> {
        tracing::info!("Checking out {} in {}", reference, dir.display());
        self.git(Some(dir), &["fetch", "--tags", "origin"]).await?;
        self.git(Some(dir), &["checkout", "--force", reference])
            .await
    }

    async fn has_local_changes(&self, dir: &Path) -> Result<bool> {
        let spec = CommandSpec::new("git")
            .arg("-C")
            .arg(dir.display().to_string())
            .args(["status", "--porcelain"]);

        let output = self.process.output(&spec).await?;
        if !output.success() {
            return Err(CrossenvError::SubprocessExit {
                program: "git status".to_string(),
                code: output.code,
            });
        }
        Ok(!output.stdout.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::RecordingProcess;

    #[tokio::test]
    async fn test_clone_command() {
        let process = Arc::new(RecordingProcess::new());
        let vcs = GitVcs::new(process.clone());

        vcs.clone_repo("https://github.com/emscripten-core/emsdk.git", Path::new("/sdks/emsdk"))
            .await
            .unwrap();

        let calls = process.calls();
        assert_eq!(
            calls[0].args,
            vec![
                "clone",
                "https://github.com/emscripten-core/emsdk.git",
                "/sdks/emsdk"
            ]
        );
    }

    #[tokio::test]
    async fn test_update_forces_reset() {
        let process = Arc::new(RecordingProcess::new());
        let vcs = GitVcs::new(process.clone());

        vcs.update(Path::new("/sdks/emsdk"), "https://example.com/emsdk.git")
            .await
            .unwrap();

        let calls = process.calls();
        let last = calls.last().unwrap();
        assert_eq!(last.args, vec!["-C", "/sdks/emsdk", "reset", "--hard", "origin/HEAD"]);
        assert!(calls
            .iter()
            .any(|c| c.args.contains(&"fetch".to_string())));
    }

    #[tokio::test]
    async fn test_failed_git_step_stops_sequence() {
        let process = Arc::new(RecordingProcess::with_exit_code(128));
        let vcs = GitVcs::new(process.clone());

        let err = vcs
            .update(Path::new("/sdks/emsdk"), "https://example.com/emsdk.git")
            .await
            .unwrap_err();

        assert!(matches!(err, CrossenvError::SubprocessExit { code: 128, .. }));
        assert_eq!(process.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_has_local_changes_reads_porcelain() {
        let process = Arc::new(RecordingProcess::new().stdout(" M emsdk.py\n"));
        let vcs = GitVcs::new(process);
        assert!(vcs.has_local_changes(Path::new("/sdks/emsdk")).await.unwrap());

        let clean = GitVcs::new(Arc::new(RecordingProcess::new()));
        assert!(!clean.has_local_changes(Path::new("/sdks/emsdk")).await.unwrap());
    }
}
