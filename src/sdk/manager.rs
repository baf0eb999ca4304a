//! Install, update and uninstall one SDK.
//!
//! Every operation runs its steps strictly in order and stops at the first
//! failure. Nothing is retried and nothing is rolled back: a failed install
//! may leave a temporary archive or a partial directory behind, which
//! `uninstall` clears.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{SdkDescriptor, SdkSource, SdkState};
use crate::error::{CrossenvError, Result};
use crate::platform::HostPlatform;
use crate::probe::ProbeRegistry;
use crate::services::{CommandSpec, Services};

/// What a lifecycle call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Done,
    NothingToDo,
    /// The user declined the confirmation prompt.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkStatus {
    pub name: String,
    pub state: SdkState,
    pub dir: PathBuf,
    pub default_version: String,
}

pub struct SdkLifecycleManager {
    descriptor: SdkDescriptor,
    root: PathBuf,
    probes: Arc<ProbeRegistry>,
    services: Services,
}

impl SdkLifecycleManager {
    pub fn new(
        descriptor: SdkDescriptor,
        root: impl Into<PathBuf>,
        probes: Arc<ProbeRegistry>,
        services: Services,
    ) -> Self {
        Self {
            descriptor,
            root: root.into(),
            probes,
            services,
        }
    }

    pub fn descriptor(&self) -> &SdkDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn host(&self) -> HostPlatform {
        self.probes.host()
    }

    /// `<sdk_root>/<name>`
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.descriptor.name)
    }

    pub fn is_installed(&self) -> bool {
        self.dir().is_dir()
    }

    pub fn state(&self) -> SdkState {
        if self.is_installed() {
            SdkState::Installed
        } else {
            SdkState::Absent
        }
    }

    pub fn status(&self) -> SdkStatus {
        SdkStatus {
            name: self.descriptor.name.clone(),
            state: self.state(),
            dir: self.dir(),
            default_version: self.descriptor.default_version.clone(),
        }
    }

    fn transition(&self, to: SdkState) {
        tracing::info!(sdk = %self.descriptor.name, state = %to, "SDK state changed");
    }

    /// Installs `version`, or the descriptor's default version.
    ///
    /// Refuses to touch the filesystem if the SDK is already present.
    pub async fn install(&self, version: Option<&str>) -> Result<LifecycleOutcome> {
        if self.is_installed() {
            return Err(CrossenvError::AlreadyInstalled {
                sdk: self.descriptor.name.clone(),
                command: self.descriptor.command.clone(),
            });
        }

        let version = version.unwrap_or(&self.descriptor.default_version);
        self.transition(SdkState::Installing);

        match self.descriptor.source {
            SdkSource::Archive {
                ref url_template,
                ref extracted_dir_template,
            } => {
                self.install_archive(url_template, extracted_dir_template, version)
                    .await?
            }
            SdkSource::Repository {
                ref url,
                ref reference,
                ref tool,
            } => {
                self.install_repository(url, reference.as_deref(), tool, version)
                    .await?
            }
        }

        self.transition(SdkState::Installed);
        Ok(LifecycleOutcome::Done)
    }

    async fn install_archive(
        &self,
        url_template: &str,
        extracted_dir_template: &str,
        version: &str,
    ) -> Result<()> {
        if let Some(tool) = self.services.extractor.required_tool() {
            self.probes.require(tool, "extract SDK archives").await?;
        }

        let host = self.host();
        let url = host.expand(url_template, version);
        let extracted = self.root.join(host.expand(extracted_dir_template, version));

        // Another SDK may be creating the root at the same time
        tokio::fs::create_dir_all(&self.root).await?;

        let temp_name = format!(".{}-download.tmp", self.descriptor.name);
        let archive = self
            .services
            .downloader
            .download(&url, &self.root, &temp_name)
            .await?;

        self.services.extractor.extract(&archive, &self.root).await?;

        if !extracted.is_dir() {
            return Err(CrossenvError::Extraction {
                archive: archive.clone(),
                message: format!(
                    "archive did not contain the expected directory '{}'",
                    extracted.display()
                ),
            });
        }

        tracing::debug!("Renaming {} to {}", extracted.display(), self.dir().display());
        tokio::fs::rename(&extracted, self.dir()).await?;
        tokio::fs::remove_file(&archive).await?;

        Ok(())
    }

    async fn install_repository(
        &self,
        url: &str,
        reference: Option<&str>,
        tool: &str,
        version: &str,
    ) -> Result<()> {
        if let Some(vcs_tool) = self.services.vcs.required_tool() {
            self.probes.require(vcs_tool, "clone SDK repositories").await?;
        }

        tokio::fs::create_dir_all(&self.root).await?;
        self.sync_repository(url, reference).await?;

        let dir = self.dir();
        let tool = dir.join(self.host().expand(tool, version));

        for action in ["install", "activate"] {
            let spec = CommandSpec::new(tool.display().to_string())
                .arg(action)
                .arg(version)
                .cwd(&dir);
            let code = self.services.process.run(&spec).await?;
            if code != 0 {
                return Err(CrossenvError::SubprocessExit {
                    program: format!("{} {}", tool.display(), action),
                    code,
                });
            }
        }

        Ok(())
    }

    /// Clones when absent, force-syncs when present.
    async fn sync_repository(&self, url: &str, reference: Option<&str>) -> Result<()> {
        let dir = self.dir();
        if dir.is_dir() {
            self.services.vcs.update(&dir, url).await?;
        } else {
            self.services.vcs.clone_repo(url, &dir).await?;
        }

        if let Some(reference) = reference {
            self.services.vcs.checkout(&dir, reference).await?;
        }
        Ok(())
    }

    /// Re-syncs a repository-based SDK with its remote.
    ///
    /// Local modifications are discarded; unless `force` is set the user is
    /// asked first.
    pub async fn update(&self, force: bool) -> Result<LifecycleOutcome> {
        let SdkSource::Repository {
            ref url,
            ref reference,
            ..
        } = self.descriptor.source
        else {
            return Err(CrossenvError::usage(
                format!("{} is installed from a release archive and cannot be updated in place", self.descriptor.name),
                format!(
                    "run 'crossenv sdk {0} uninstall' then 'crossenv sdk {0} install <version>'",
                    self.descriptor.command
                ),
            ));
        };

        if !self.is_installed() {
            return Err(CrossenvError::NotInstalled {
                sdk: self.descriptor.name.clone(),
                command: self.descriptor.command.clone(),
            });
        }

        let dir = self.dir();
        if !force && self.services.vcs.has_local_changes(&dir).await? {
            let confirmed = self.services.prompt.confirm(&format!(
                "{} has local modifications that will be discarded. Continue?",
                dir.display()
            ))?;
            if !confirmed {
                tracing::info!("Update of {} cancelled", self.descriptor.name);
                return Ok(LifecycleOutcome::Cancelled);
            }
        }

        self.transition(SdkState::Updating);
        self.sync_repository(url, reference.as_deref()).await?;
        self.transition(SdkState::Installed);

        Ok(LifecycleOutcome::Done)
    }

    /// Deletes the SDK directory after confirmation.
    pub async fn uninstall(&self) -> Result<LifecycleOutcome> {
        if !self.is_installed() {
            tracing::warn!("{} is not installed, nothing to do", self.descriptor.name);
            return Ok(LifecycleOutcome::NothingToDo);
        }

        let dir = self.dir();
        let confirmed = self
            .services
            .prompt
            .confirm(&format!("Remove {} from {}?", self.descriptor.name, dir.display()))?;
        if !confirmed {
            return Ok(LifecycleOutcome::Cancelled);
        }

        self.transition(SdkState::Uninstalling);
        tokio::fs::remove_dir_all(&dir).await?;
        self.transition(SdkState::Absent);

        Ok(LifecycleOutcome::Done)
    }

    /// Runs the repository SDK's own `list` action, if it has one installed.
    pub async fn list_versions(&self) -> Result<bool> {
        let SdkSource::Repository { ref tool, .. } = self.descriptor.source else {
            return Ok(false);
        };
        if !self.is_installed() {
            return Ok(false);
        }

        let dir = self.dir();
        let tool = dir.join(self.host().expand(tool, &self.descriptor.default_version));
        let spec = CommandSpec::new(tool.display().to_string())
            .arg("list")
            .cwd(&dir);
        let code = self.services.process.run(&spec).await?;
        if code != 0 {
            return Err(CrossenvError::SubprocessExit {
                program: format!("{} list", tool.display()),
                code,
            });
        }
        Ok(true)
    }

    /// Path of a file inside the SDK directory.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir().join(relative)
    }
}
