//! Black-box collaborators.
//!
//! Process spawning, downloads, archive extraction, version control and
//! interactive prompts are consumed through the traits in this module. The
//! SDK lifecycle and the runners only ever see `Arc<dyn ...>` handles, so the
//! host decides which implementation is live and tests swap in fakes.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────────┐
//! │   Services   │ ──► │ ProcessRunner  (tokio)       │
//! │ (Arc handles)│     │ Downloader     (reqwest)     │
//! └──────────────┘     │ Extractor      (tar)         │
//!                      │ Vcs            (git)         │
//!                      │ Prompt         (dialoguer)   │
//!                      └──────────────────────────────┘
//! ```

pub mod download;
pub mod extract;
pub mod process;
pub mod prompt;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use download::HttpDownloader;
pub use extract::TarExtractor;
pub use process::SystemProcessRunner;
pub use prompt::{AssumeYes, DialoguerPrompt};
pub use vcs::GitVcs;

/// A child process to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for log lines.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a quiet process run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// `runProcess(cmd, args, cwd) -> exitCode | error`
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs with inherited stdio and waits for exit.
    ///
    /// Returns the exit code; an error means the process could not be spawned.
    async fn run(&self, cmd: &CommandSpec) -> Result<i32>;

    /// Runs with captured stdio.
    async fn output(&self, cmd: &CommandSpec) -> Result<ProcessOutput>;
}

/// `download(url, destDir, filename) -> file | error`
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest_dir: &Path, filename: &str) -> Result<PathBuf>;
}

/// `extractArchive(file, destDir) -> void | error`
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Host executable this extractor shells out to, if any.
    fn required_tool(&self) -> Option<&str> {
        None
    }

    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()>;
}

/// `vcsClone(url, destDir)` / `vcsUpdate(dir, url)`
#[async_trait]
pub trait Vcs: Send + Sync {
    fn required_tool(&self) -> Option<&str> {
        None
    }

    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Forces `dir` to match `url`'s default branch, discarding local edits.
    async fn update(&self, dir: &Path, url: &str) -> Result<()>;

    /// Forces `dir` to the given ref after fetching.
    async fn checkout(&self, dir: &Path, reference: &str) -> Result<()>;

    async fn has_local_changes(&self, dir: &Path) -> Result<bool>;
}

/// Yes/no questions to the user.
pub trait Prompt: Send + Sync {
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Capability handles passed to plugins and SDK managers.
#[derive(Clone)]
pub struct Services {
    pub process: Arc<dyn ProcessRunner>,
    pub downloader: Arc<dyn Downloader>,
    pub extractor: Arc<dyn Extractor>,
    pub vcs: Arc<dyn Vcs>,
    pub prompt: Arc<dyn Prompt>,
}

impl Services {
    /// Real implementations backed by the host system.
    pub fn system(assume_yes: bool) -> Self {
        let process: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner);
        let prompt: Arc<dyn Prompt> = if assume_yes {
            Arc::new(AssumeYes)
        } else {
            Arc::new(DialoguerPrompt)
        };

        Self {
            downloader: Arc::new(HttpDownloader::new()),
            extractor: Arc::new(TarExtractor::new(process.clone())),
            vcs: Arc::new(GitVcs::new(process.clone())),
            process,
            prompt,
        }
    }
}
