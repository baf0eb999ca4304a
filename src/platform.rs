//! Host platform detection.
//!
//! OS and architecture are a small closed enumeration. Everything that needs
//! a platform-qualified name (SDK archive URLs, extracted directory names,
//! executable suffixes) goes through [`HostPlatform::expand`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CrossenvError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Linux,
    Macos,
    Windows,
}

impl HostOs {
    pub fn all() -> &'static [HostOs] {
        &[Self::Linux, Self::Macos, Self::Windows]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostArch {
    X86_64,
    Arm64,
}

impl HostArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

/// The `{os x arch}` pair crossenv is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPlatform {
    pub os: HostOs,
    pub arch: HostArch,
}

impl HostPlatform {
    pub const fn new(os: HostOs, arch: HostArch) -> Self {
        Self { os, arch }
    }

    /// Detects the current platform at compile time.
    pub fn detect() -> Result<Self> {
        let os = if cfg!(target_os = "linux") {
            HostOs::Linux
        } else if cfg!(target_os = "macos") {
            HostOs::Macos
        } else if cfg!(target_os = "windows") {
            HostOs::Windows
        } else {
            return Err(CrossenvError::UnsupportedPlatform {
                what: "crossenv".to_string(),
                platform: std::env::consts::OS.to_string(),
            });
        };

        let arch = if cfg!(target_arch = "x86_64") {
            HostArch::X86_64
        } else if cfg!(target_arch = "aarch64") {
            HostArch::Arm64
        } else {
            return Err(CrossenvError::UnsupportedPlatform {
                what: "crossenv".to_string(),
                platform: std::env::consts::ARCH.to_string(),
            });
        };

        Ok(Self { os, arch })
    }

    /// Suffix appended to executable names on this platform.
    pub fn exe_suffix(&self) -> &'static str {
        match self.os {
            HostOs::Windows => ".exe",
            _ => "",
        }
    }

    /// Expands a name template for this platform.
    ///
    /// Placeholders: `{os}`, `{arch}`, `{exe}`, `{version}` and `{major}`
    /// (the version up to its first dot).
    ///
    /// ```
    /// use crossenv::platform::{HostArch, HostOs, HostPlatform};
    ///
    /// let host = HostPlatform::new(HostOs::Macos, HostArch::Arm64);
    /// assert_eq!(
    ///     host.expand("wasi-sdk-{major}/wasi-sdk-{version}-{arch}-{os}", "25.0"),
    ///     "wasi-sdk-25/wasi-sdk-25.0-arm64-macos"
    /// );
    /// ```
    pub fn expand(&self, template: &str, version: &str) -> String {
        let major = version.split('.').next().unwrap_or(version);
        template
            .replace("{os}", self.os.as_str())
            .replace("{arch}", self.arch.as_str())
            .replace("{exe}", self.exe_suffix())
            .replace("{major}", major)
            .replace("{version}", version)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch.as_str(), self.os.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_current_platform() {
        // CI only runs on supported hosts
        let host = HostPlatform::detect().unwrap();
        assert!(HostOs::all().contains(&host.os));
    }

    #[test]
    fn test_expand_linux() {
        let host = HostPlatform::new(HostOs::Linux, HostArch::X86_64);
        assert_eq!(
            host.expand("wasi-sdk-{version}-{arch}-{os}.tar.gz", "24.0"),
            "wasi-sdk-24.0-x86_64-linux.tar.gz"
        );
    }

    #[test]
    fn test_expand_exe_suffix() {
        let windows = HostPlatform::new(HostOs::Windows, HostArch::X86_64);
        let linux = HostPlatform::new(HostOs::Linux, HostArch::Arm64);
        assert_eq!(windows.expand("bin/clang{exe}", "1"), "bin/clang.exe");
        assert_eq!(linux.expand("bin/clang{exe}", "1"), "bin/clang");
    }

    #[test]
    fn test_expand_major_without_dot() {
        let host = HostPlatform::new(HostOs::Linux, HostArch::X86_64);
        assert_eq!(host.expand("v{major}", "latest"), "vlatest");
    }

    #[test]
    fn test_display() {
        let host = HostPlatform::new(HostOs::Macos, HostArch::Arm64);
        assert_eq!(host.to_string(), "arm64-macos");
    }
}
