//! In-memory fakes for the collaborator traits.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    CommandSpec, Downloader, Extractor, ProcessOutput, ProcessRunner, Prompt, Services, Vcs,
};
use crate::error::{CrossenvError, Result};

pub struct RecordingProcess {
    calls: Mutex<Vec<CommandSpec>>,
    code: i32,
    stdout: String,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::with_exit_code(0)
    }

    pub fn with_exit_code(code: i32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            code,
            stdout: String::new(),
        }
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingProcess {
    async fn run(&self, cmd: &CommandSpec) -> Result<i32> {
        self.calls.lock().unwrap().push(cmd.clone());
        Ok(self.code)
    }

    async fn output(&self, cmd: &CommandSpec) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(cmd.clone());
        Ok(ProcessOutput {
            code: self.code,
            stdout: self.stdout.clone(),
            stderr: String::new(),
        })
    }
}

/// Writes a small file instead of fetching anything.
#[derive(Default)]
pub struct FakeDownloader {
    urls: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeDownloader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest_dir: &Path, filename: &str) -> Result<PathBuf> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(CrossenvError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(filename);
        std::fs::write(&dest, b"archive")?;
        Ok(dest)
    }
}

/// Creates `produces` inside the destination directory.
pub struct FakeExtractor {
    produces: String,
    tool: Option<String>,
    archives: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    pub fn new(produces: &str) -> Self {
        Self {
            produces: produces.to_string(),
            tool: None,
            archives: Mutex::new(Vec::new()),
        }
    }

    pub fn requiring(mut self, tool: &str) -> Self {
        self.tool = Some(tool.to_string());
        self
    }

    pub fn archives(&self) -> Vec<PathBuf> {
        self.archives.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn required_tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        self.archives.lock().unwrap().push(archive.to_path_buf());
        let out = dest_dir.join(&self.produces);
        std::fs::create_dir_all(out.join("bin"))?;
        std::fs::write(out.join("bin").join("clang"), b"")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeVcs {
    ops: Mutex<Vec<String>>,
    local_changes: bool,
}

impl FakeVcs {
    pub fn with_local_changes() -> Self {
        Self {
            local_changes: true,
            ..Default::default()
        }
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.ops.lock().unwrap().push(format!("clone {}", url));
        std::fs::create_dir_all(dest)?;
        Ok(())
    }

    async fn update(&self, _dir: &Path, url: &str) -> Result<()> {
        self.ops.lock().unwrap().push(format!("update {}", url));
        Ok(())
    }

    async fn checkout(&self, _dir: &Path, reference: &str) -> Result<()> {
        self.ops.lock().unwrap().push(format!("checkout {}", reference));
        Ok(())
    }

    async fn has_local_changes(&self, _dir: &Path) -> Result<bool> {
        Ok(self.local_changes)
    }
}

/// Replays queued answers; answers no once the queue is empty.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}

/// A `Services` bundle whose handles are kept for assertions.
pub struct FakeServices {
    pub process: Arc<RecordingProcess>,
    pub downloader: Arc<FakeDownloader>,
    pub extractor: Arc<FakeExtractor>,
    pub vcs: Arc<FakeVcs>,
    pub prompt: Arc<ScriptedPrompt>,
}

impl FakeServices {
    pub fn new(extracted_dir: &str) -> Self {
        Self {
            process: Arc::new(RecordingProcess::new()),
            downloader: Arc::new(FakeDownloader::default()),
            extractor: Arc::new(FakeExtractor::new(extracted_dir)),
            vcs: Arc::new(FakeVcs::default()),
            prompt: Arc::new(ScriptedPrompt::default()),
        }
    }

    pub fn answering(mut self, answers: &[bool]) -> Self {
        self.prompt = Arc::new(ScriptedPrompt::answering(answers));
        self
    }

    pub fn services(&self) -> Services {
        Services {
            process: self.process.clone(),
            downloader: self.downloader.clone(),
            extractor: self.extractor.clone(),
            vcs: self.vcs.clone(),
            prompt: self.prompt.clone(),
        }
    }
}
