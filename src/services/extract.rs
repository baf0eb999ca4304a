use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandSpec, Extractor, ProcessRunner};
use crate::error::{CrossenvError, Result};

/// Extracts archives by shelling out to the host's `tar`.
///
/// bsdtar (macOS, Windows 10+) and GNU tar both detect compression from the
/// archive itself, so one invocation covers `.tar.gz`, `.tar.xz` and `.zip`
/// on platforms whose tar understands zip.
pub struct TarExtractor {
    process: Arc<dyn ProcessRunner>,
}

impl TarExtractor {
    pub fn new(process: Arc<dyn ProcessRunner>) -> Self {
        Self { process }
    }
}

#[async_trait]
impl Extractor for TarExtractor {
    fn required_tool(&self) -> Option<&str> {
        Some("tar")
    }

    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        tracing::info!("Extracting {}", archive.display());

        let spec = CommandSpec::new("tar")
            .arg("-xf")
            .arg(archive.display().to_string())
            .arg("-C")
            .arg(dest_dir.display().to_string());

        let output = self.process.output(&spec).await?;
        if !output.success() {
            return Err(CrossenvError::Extraction {
                archive: archive.to_path_buf(),
                message: format!("tar exited with code {}: {}", output.code, output.stderr.trim()),
            });
        }

        Ok(())
    }
}
