//! Build configurations.
//!
//! A configuration binds a target platform, a generator and a build mode to
//! a runner and a toolchain. Plugins register [`ConfigDescriptor`]s; the
//! [`ConfigRegistry`] resolves each one against its base into an immutable
//! [`ConfigurationRecord`].
//!
//! # Composition
//!
//! A descriptor with a `base` starts from a copy of the base's resolved
//! record, then its own explicitly set fields replace the inherited ones.
//! `variables` is the one mapping-valued field: individual keys are added or
//! replaced, the rest of the base's keys are kept.

pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CrossenvError, Result};
use crate::platform::{HostOs, HostPlatform};

pub use registry::ConfigRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Native,
    Wasi,
    Emscripten,
    Ios,
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Native => "native",
            Self::Wasi => "wasi",
            Self::Emscripten => "emscripten",
            Self::Ios => "ios",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generator {
    Make,
    Ninja,
    IdeProject,
}

impl Generator {
    /// CMake generator name for this host.
    pub fn cmake_name(&self, os: HostOs) -> &'static str {
        match (self, os) {
            (Self::Make, HostOs::Windows) => "MinGW Makefiles",
            (Self::Make, _) => "Unix Makefiles",
            (Self::Ninja, _) => "Ninja",
            (Self::IdeProject, HostOs::Macos) => "Xcode",
            (Self::IdeProject, HostOs::Windows) => "Visual Studio 17 2022",
            (Self::IdeProject, HostOs::Linux) => "CodeBlocks - Ninja",
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Make => "make",
            Self::Ninja => "ninja",
            Self::IdeProject => "ide-project",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    pub fn cmake_build_type(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// What to open after generating the build tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opener {
    #[default]
    None,
    Ide,
}

/// Backend-specific configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "ON"),
            Self::Bool(false) => write!(f, "OFF"),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Variable {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Outcome of a configuration's validation predicate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub hints: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            hints: Vec::new(),
        }
    }

    pub fn invalid(hint: impl Into<String>) -> Self {
        Self {
            valid: false,
            hints: vec![hint.into()],
        }
    }

    /// Combines two results; valid only if both are.
    pub fn and(mut self, other: Validation) -> Self {
        self.valid &= other.valid;
        self.hints.extend(other.hints);
        self
    }
}

/// What a validation predicate may look at.
#[derive(Debug, Clone)]
pub struct ValidationEnv {
    pub sdk_root: PathBuf,
    pub host: HostPlatform,
}

impl ValidationEnv {
    pub fn new(sdk_root: impl Into<PathBuf>, host: HostPlatform) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            host,
        }
    }

    pub fn sdk_dir(&self, sdk_name: &str) -> PathBuf {
        self.sdk_root.join(sdk_name)
    }
}

/// Pure predicate: may only inspect the filesystem.
pub type ValidateFn = Arc<dyn Fn(&ValidationEnv) -> Validation + Send + Sync>;

/// A configuration as declared by a plugin or project, before inheritance.
#[derive(Clone, Default)]
pub struct ConfigDescriptor {
    pub name: String,
    pub base: Option<String>,
    pub platform: Option<TargetPlatform>,
    pub runner: Option<String>,
    pub generator: Option<Generator>,
    pub build_mode: Option<BuildMode>,
    pub opener: Option<Opener>,
    pub toolchain_file: Option<PathBuf>,
    pub validate: Option<ValidateFn>,
    pub variables: BTreeMap<String, Variable>,
    /// Hidden configurations are bases; not inherited.
    pub hidden: bool,
}

impl ConfigDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn derive(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: Some(base.into()),
            ..Default::default()
        }
    }

    pub fn platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = Some(runner.into());
        self
    }

    pub fn generator(mut self, generator: Generator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn build_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = Some(mode);
        self
    }

    pub fn opener(mut self, opener: Opener) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn toolchain_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.toolchain_file = Some(path.into());
        self
    }

    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&ValidationEnv) -> Validation + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<Variable>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Applies this descriptor on top of `base` (already resolved).
    ///
    /// The base's name must match `self.base`; the registry guarantees that.
    pub fn resolve(self, base: Option<&ConfigurationRecord>) -> Result<ConfigurationRecord> {
        let Some(base) = base else {
            let platform = self.platform.ok_or_else(|| CrossenvError::IncompleteConfig {
                name: self.name.clone(),
                field: "platform".to_string(),
            })?;

            return Ok(ConfigurationRecord {
                name: self.name,
                base: None,
                platform,
                runner: self.runner,
                generator: self.generator,
                build_mode: self.build_mode.unwrap_or_default(),
                opener: self.opener.unwrap_or_default(),
                toolchain_file: self.toolchain_file,
                validate: self.validate,
                variables: self.variables,
                hidden: self.hidden,
            });
        };

        let mut variables = base.variables.clone();
        variables.extend(self.variables);

        Ok(ConfigurationRecord {
            name: self.name,
            base: Some(base.name.clone()),
            platform: self.platform.unwrap_or(base.platform),
            runner: self.runner.or_else(|| base.runner.clone()),
            generator: self.generator.or(base.generator),
            build_mode: self.build_mode.unwrap_or(base.build_mode),
            opener: self.opener.unwrap_or(base.opener),
            toolchain_file: self.toolchain_file.or_else(|| base.toolchain_file.clone()),
            validate: self.validate.or_else(|| base.validate.clone()),
            variables,
            hidden: self.hidden,
        })
    }
}

/// A fully resolved, immutable configuration.
#[derive(Clone)]
pub struct ConfigurationRecord {
    pub name: String,
    /// Name of the configuration this one was derived from.
    pub base: Option<String>,
    pub platform: TargetPlatform,
    pub runner: Option<String>,
    pub generator: Option<Generator>,
    pub build_mode: BuildMode,
    pub opener: Opener,
    pub toolchain_file: Option<PathBuf>,
    pub validate: Option<ValidateFn>,
    pub variables: BTreeMap<String, Variable>,
    pub hidden: bool,
}

impl ConfigurationRecord {
    pub fn check(&self, env: &ValidationEnv) -> Validation {
        match self.validate {
            Some(ref validate) => validate(env),
            None => Validation::ok(),
        }
    }

    pub fn toolchain_file(&self) -> Option<&Path> {
        self.toolchain_file.as_deref()
    }
}

impl fmt::Debug for ConfigurationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationRecord")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("platform", &self.platform)
            .field("runner", &self.runner)
            .field("generator", &self.generator)
            .field("build_mode", &self.build_mode)
            .field("opener", &self.opener)
            .field("toolchain_file", &self.toolchain_file)
            .field("validate", &self.validate.is_some())
            .field("variables", &self.variables)
            .field("hidden", &self.hidden)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_requires_platform() {
        let err = ConfigDescriptor::new("orphan").resolve(None).unwrap_err();
        assert!(matches!(err, CrossenvError::IncompleteConfig { ref field, .. } if field == "platform"));
    }

    #[test]
    fn test_root_defaults() {
        let record = ConfigDescriptor::new("wasi")
            .platform(TargetPlatform::Wasi)
            .resolve(None)
            .unwrap();
        assert_eq!(record.build_mode, BuildMode::Debug);
        assert_eq!(record.opener, Opener::None);
        assert_eq!(record.generator, None);
        assert!(record.base.is_none());
    }

    #[test]
    fn test_derived_overrides_replace() {
        let base = ConfigDescriptor::new("base")
            .platform(TargetPlatform::Wasi)
            .build_mode(BuildMode::Debug)
            .resolve(None)
            .unwrap();

        let derived = ConfigDescriptor::derive("derived", "base")
            .generator(Generator::Ninja)
            .build_mode(BuildMode::Release)
            .resolve(Some(&base))
            .unwrap();

        assert_eq!(derived.generator, Some(Generator::Ninja));
        assert_eq!(derived.build_mode, BuildMode::Release);
        assert_eq!(derived.platform, TargetPlatform::Wasi);
        assert_eq!(derived.base.as_deref(), Some("base"));
    }

    #[test]
    fn test_unset_fields_inherit() {
        let base = ConfigDescriptor::new("base")
            .platform(TargetPlatform::Emscripten)
            .runner("browser")
            .generator(Generator::Make)
            .opener(Opener::Ide)
            .toolchain_file("/sdks/emsdk/Emscripten.cmake")
            .resolve(None)
            .unwrap();

        let derived = ConfigDescriptor::derive("derived", "base")
            .build_mode(BuildMode::Release)
            .resolve(Some(&base))
            .unwrap();

        assert_eq!(derived.runner.as_deref(), Some("browser"));
        assert_eq!(derived.generator, Some(Generator::Make));
        assert_eq!(derived.opener, Opener::Ide);
        assert_eq!(
            derived.toolchain_file(),
            Some(Path::new("/sdks/emsdk/Emscripten.cmake"))
        );
    }

    #[test]
    fn test_variables_merge_per_key() {
        let base = ConfigDescriptor::new("base")
            .platform(TargetPlatform::Wasi)
            .variable("WASI_SDK_PREFIX", "/sdks/wasi-sdk")
            .variable("USE_THREADS", false)
            .resolve(None)
            .unwrap();

        let derived = ConfigDescriptor::derive("derived", "base")
            .variable("USE_THREADS", true)
            .variable("OPT", 2.0)
            .resolve(Some(&base))
            .unwrap();

        assert_eq!(derived.variables.len(), 3);
        assert_eq!(derived.variables["USE_THREADS"], Variable::Bool(true));
        assert_eq!(
            derived.variables["WASI_SDK_PREFIX"],
            Variable::Text("/sdks/wasi-sdk".to_string())
        );
        // base untouched
        assert_eq!(base.variables["USE_THREADS"], Variable::Bool(false));
    }

    #[test]
    fn test_hidden_not_inherited() {
        let base = ConfigDescriptor::new("base")
            .platform(TargetPlatform::Native)
            .hidden()
            .resolve(None)
            .unwrap();
        let derived = ConfigDescriptor::derive("derived", "base")
            .resolve(Some(&base))
            .unwrap();
        assert!(base.hidden);
        assert!(!derived.hidden);
    }

    #[test]
    fn test_validation_and() {
        let combined = Validation::ok()
            .and(Validation::invalid("first"))
            .and(Validation::invalid("second"));
        assert!(!combined.valid);
        assert_eq!(combined.hints, vec!["first", "second"]);
        assert!(Validation::ok().and(Validation::ok()).valid);
    }

    #[test]
    fn test_variable_display_and_yaml() {
        assert_eq!(Variable::Bool(true).to_string(), "ON");
        assert_eq!(Variable::Number(65536.0).to_string(), "65536");

        let vars: BTreeMap<String, Variable> =
            serde_yaml::from_str("a: true\nb: 3\nc: text\n").unwrap();
        assert_eq!(vars["a"], Variable::Bool(true));
        assert_eq!(vars["b"], Variable::Number(3.0));
        assert_eq!(vars["c"], Variable::Text("text".to_string()));
    }

    #[test]
    fn test_generator_names() {
        assert_eq!(Generator::Ninja.cmake_name(HostOs::Linux), "Ninja");
        assert_eq!(Generator::IdeProject.cmake_name(HostOs::Macos), "Xcode");
        assert_eq!(Generator::Make.cmake_name(HostOs::Linux), "Unix Makefiles");
        let parsed: Generator = serde_yaml::from_str("ide-project").unwrap();
        assert_eq!(parsed, Generator::IdeProject);
    }
}
