//! SDK descriptors and lifecycle.
//!
//! Each SDK owns exactly one directory under the shared SDK root, named after
//! the SDK and never after its version:
//!
//! ```text
//! <sdk_root>/
//! ├── wasi-sdk/     ← archive-based: download → extract → rename
//! └── emsdk/        ← repository-based: clone → install → activate
//! ```
//!
//! Whether that directory exists is the only notion of "installed".

pub mod manager;

use std::fmt;

pub use manager::{LifecycleOutcome, SdkLifecycleManager, SdkStatus};

/// Where an SDK comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkSource {
    /// A release archive per platform and version.
    ///
    /// Both templates are expanded with
    /// [`HostPlatform::expand`](crate::platform::HostPlatform::expand).
    Archive {
        url_template: String,
        /// Top-level directory the archive unpacks to.
        extracted_dir_template: String,
    },
    /// A git repository that ships its own installer.
    Repository {
        url: String,
        /// Ref to pin after cloning; the default branch when unset.
        reference: Option<String>,
        /// Installer entry point, relative to the clone (template).
        tool: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkDescriptor {
    /// Directory name under the SDK root.
    pub name: String,
    /// Version used when none is requested.
    pub default_version: String,
    pub source: SdkSource,
    /// `crossenv sdk <command>` subcommand that manages this SDK.
    pub command: String,
}

impl SdkDescriptor {
    pub fn is_repository(&self) -> bool {
        matches!(self.source, SdkSource::Repository { .. })
    }
}

/// Lifecycle states. `Installing`, `Updating` and `Uninstalling` are only
/// ever observed in logs; an interrupted transition leaves a partial
/// directory that reads as `Installed` until uninstalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkState {
    Absent,
    Installing,
    Installed,
    Updating,
    Uninstalling,
}

impl fmt::Display for SdkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Updating => "updating",
            Self::Uninstalling => "uninstalling",
        };
        write!(f, "{}", name)
    }
}
