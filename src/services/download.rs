//! Streaming HTTP downloads with a progress bar.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use super::Downloader;
use crate::error::{CrossenvError, Result};

pub struct HttpDownloader {
    client: reqwest::Client,
    show_progress: bool,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .user_agent(concat!("crossenv/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            show_progress: true,
        }
    }

    /// Disables the terminal progress bar.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::with_template(
                        "  {spinner:.cyan} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        }
    }
}

fn network_error(url: &str, err: impl std::fmt::Display) -> CrossenvError {
    CrossenvError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest_dir: &Path, filename: &str) -> Result<PathBuf> {
        tracing::info!("Downloading {}", url);

        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(filename);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network_error(
                url,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ),
            ));
        }

        let bar = self.progress_bar(response.content_length());
        let mut file = tokio::fs::File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| network_error(url, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            bar.set_position(written);
        }

        file.flush().await?;
        bar.finish_and_clear();

        tracing::debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sdk.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = HttpDownloader::new().quiet();
        let url = format!("{}/sdk.tar.gz", server.uri());

        let file = downloader
            .download(&url, dir.path(), "tmp-download")
            .await
            .unwrap();

        assert_eq!(file, dir.path().join("tmp-download"));
        assert_eq!(std::fs::read(&file).unwrap(), b"archive-bytes");
    }

    #[tokio::test]
    async fn test_download_http_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = HttpDownloader::new().quiet();
        let url = format!("{}/missing.tar.gz", server.uri());

        let err = downloader
            .download(&url, dir.path(), "tmp-download")
            .await
            .unwrap_err();

        assert!(matches!(err, CrossenvError::Network { .. }));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_download_creates_dest_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sdks");
        let downloader = HttpDownloader::new().quiet();

        downloader
            .download(&server.uri(), &nested, "file")
            .await
            .unwrap();
        assert!(nested.join("file").exists());
    }
}
