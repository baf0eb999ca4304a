use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::{Invocation, Runner};
use crate::error::{CrossenvError, Result};

/// Serves the project's build directory on a fixed local port and opens a
/// browser at the artifact.
///
/// An artifact outside the build directory is served from its own directory.
/// Serving is a foreground call: it only returns on a server error, the user
/// stops it by interrupting the process.
pub struct BrowserRunner {
    port: u16,
    /// Browser executable to launch instead of the system default.
    browser: Option<String>,
}

impl BrowserRunner {
    pub fn new(port: u16, browser: Option<String>) -> Self {
        Self { port, browser }
    }

    /// Same address the server binds, so `localhost` resolving to `::1`
    /// cannot miss it.
    pub fn url(port: u16, path: &str) -> String {
        format!("http://127.0.0.1:{}/{}", port, path)
    }

    /// Directory to serve and the artifact's URL path inside it.
    pub fn serve_root(invocation: &Invocation<'_>) -> (PathBuf, String) {
        let artifact = invocation.cwd().join(&invocation.target.artifact);
        let build_dir = invocation.project.build_dir();

        if let Ok(relative) = artifact.strip_prefix(&build_dir) {
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            return (build_dir, path);
        }

        let dir = artifact
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| invocation.cwd());
        (dir, invocation.target.file_name())
    }

    /// Static file router rooted at `root`, with COOP/COEP headers so pages
    /// may use SharedArrayBuffer (threads).
    pub fn router(root: &Path) -> Router {
        Router::new()
            .fallback_service(ServeDir::new(root))
            .layer(TraceLayer::new_for_http())
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("cross-origin-embedder-policy"),
                HeaderValue::from_static("require-corp"),
            ))
    }

    fn open(&self, url: &str) -> Result<()> {
        match self.browser {
            Some(ref browser) => {
                tracing::info!("Opening {} in {}", url, browser);
                tokio::process::Command::new(browser)
                    .arg(url)
                    .spawn()
                    .map_err(|e| {
                        CrossenvError::missing_tool(
                            browser.as_str(),
                            "open the artifact page",
                            format!("check the configured browser ({})", e),
                        )
                    })?;
            }
            None => {
                tracing::info!("Opening {}", url);
                if let Err(e) = webbrowser::open(url) {
                    tracing::warn!("Could not open a browser: {}. Open {} manually.", e, url);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Runner for BrowserRunner {
    async fn run(&self, invocation: &Invocation<'_>) -> Result<()> {
        let (root, path) = Self::serve_root(invocation);

        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            CrossenvError::Config(format!(
                "Cannot listen on {}: {}. Set another port with 'crossenv config set server_port <port>'",
                addr, e
            ))
        })?;
        tracing::info!("Serving {} on {}", root.display(), addr);

        let url = Self::url(self.port, &path);
        self.open(&url)?;
        println!("  Serving at {} (Ctrl+C to stop)", console::style(&url).cyan());

        axum::serve(listener, Self::router(&root)).await?;
        Ok(())
    }
}
