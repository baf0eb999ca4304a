//! Name-keyed registry of resolved configurations.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ConfigDescriptor, ConfigurationRecord, Validation, ValidationEnv};
use crate::error::{CrossenvError, Result};

/// Holds every configuration known to this run.
///
/// Records are resolved when registered and never change afterwards.
/// Registering a name again replaces the previous record; configurations
/// already derived from the old record keep what they inherited.
pub struct ConfigRegistry {
    env: ValidationEnv,
    records: BTreeMap<String, Arc<ConfigurationRecord>>,
}

impl ConfigRegistry {
    pub fn new(env: ValidationEnv) -> Self {
        Self {
            env,
            records: BTreeMap::new(),
        }
    }

    pub fn env(&self) -> &ValidationEnv {
        &self.env
    }

    /// Resolves `descriptor` against its base and stores it under its name.
    pub fn register(&mut self, descriptor: ConfigDescriptor) -> Result<Arc<ConfigurationRecord>> {
        let base = match descriptor.base {
            Some(ref base) => Some(self.records.get(base).cloned().ok_or_else(|| {
                CrossenvError::UnknownBase {
                    name: descriptor.name.clone(),
                    base: base.clone(),
                }
            })?),
            None => None,
        };

        let record = Arc::new(descriptor.resolve(base.as_deref())?);

        if self.records.contains_key(&record.name) {
            tracing::debug!("Configuration '{}' replaced", record.name);
        } else {
            tracing::debug!("Configuration '{}' registered", record.name);
        }

        self.records.insert(record.name.clone(), record.clone());
        Ok(record)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<ConfigurationRecord>> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| CrossenvError::UnknownConfig {
                name: name.to_string(),
            })
    }

    /// Runs the configuration's predicate. An invalid configuration is
    /// reported in the returned value, not as an error.
    pub fn validate(&self, name: &str) -> Result<Validation> {
        Ok(self.resolve(name)?.check(&self.env))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// All records, sorted by name.
    pub fn records(&self) -> impl Iterator<Item = &Arc<ConfigurationRecord>> {
        self.records.values()
    }

    /// Records that are not hidden bases.
    pub fn visible(&self) -> impl Iterator<Item = &Arc<ConfigurationRecord>> {
        self.records.values().filter(|r| !r.hidden)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::{BuildMode, Generator, TargetPlatform};
    use crate::platform::{HostArch, HostOs, HostPlatform};

    fn registry(root: &std::path::Path) -> ConfigRegistry {
        ConfigRegistry::new(ValidationEnv::new(
            root,
            HostPlatform::new(HostOs::Linux, HostArch::X86_64),
        ))
    }

    fn sdk_present(env: &ValidationEnv) -> Validation {
        if env.sdk_dir("wasi-sdk").is_dir() {
            Validation::ok()
        } else {
            Validation::invalid("wasi-sdk is not installed (run 'crossenv sdk wasi install')")
        }
    }

    #[test]
    fn test_resolve_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        assert!(matches!(
            registry.resolve("nope"),
            Err(CrossenvError::UnknownConfig { .. })
        ));
        assert!(matches!(
            registry.validate("nope"),
            Err(CrossenvError::UnknownConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());
        let err = registry
            .register(ConfigDescriptor::derive("wasi-make-debug", "wasi"))
            .unwrap_err();
        assert!(matches!(err, CrossenvError::UnknownBase { ref base, .. } if base == "wasi"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_inheritance_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());

        registry
            .register(
                ConfigDescriptor::new("base")
                    .platform(TargetPlatform::Wasi)
                    .build_mode(BuildMode::Debug),
            )
            .unwrap();
        registry
            .register(
                ConfigDescriptor::derive("derived", "base")
                    .generator(Generator::Ninja)
                    .build_mode(BuildMode::Release),
            )
            .unwrap();

        let base = registry.resolve("base").unwrap();
        let derived = registry.resolve("derived").unwrap();
        assert_eq!(base.generator, None);
        assert_eq!(derived.generator, Some(Generator::Ninja));
        assert_eq!(derived.build_mode, BuildMode::Release);
        assert_eq!(derived.platform, base.platform);
    }

    #[test]
    fn test_chained_inheritance() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());

        registry
            .register(
                ConfigDescriptor::new("wasi")
                    .platform(TargetPlatform::Wasi)
                    .runner("wasmtime"),
            )
            .unwrap();
        registry
            .register(ConfigDescriptor::derive("wasi-ninja", "wasi").generator(Generator::Ninja))
            .unwrap();
        registry
            .register(
                ConfigDescriptor::derive("wasi-ninja-release", "wasi-ninja")
                    .build_mode(BuildMode::Release),
            )
            .unwrap();

        let leaf = registry.resolve("wasi-ninja-release").unwrap();
        assert_eq!(leaf.runner.as_deref(), Some("wasmtime"));
        assert_eq!(leaf.generator, Some(Generator::Ninja));
        assert_eq!(leaf.build_mode, BuildMode::Release);
    }

    #[test]
    fn test_last_registration_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());

        registry
            .register(
                ConfigDescriptor::new("x")
                    .platform(TargetPlatform::Native)
                    .build_mode(BuildMode::Debug),
            )
            .unwrap();
        registry
            .register(
                ConfigDescriptor::new("x")
                    .platform(TargetPlatform::Native)
                    .build_mode(BuildMode::Release),
            )
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("x").unwrap().build_mode, BuildMode::Release);
    }

    #[test]
    fn test_replacing_base_keeps_derived_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());

        registry
            .register(ConfigDescriptor::new("base").platform(TargetPlatform::Wasi))
            .unwrap();
        registry
            .register(ConfigDescriptor::derive("child", "base"))
            .unwrap();
        registry
            .register(ConfigDescriptor::new("base").platform(TargetPlatform::Emscripten))
            .unwrap();

        assert_eq!(
            registry.resolve("child").unwrap().platform,
            TargetPlatform::Wasi
        );
    }

    #[test]
    fn test_validate_reports_missing_sdk() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());
        registry
            .register(
                ConfigDescriptor::new("wasi-make-debug")
                    .platform(TargetPlatform::Wasi)
                    .validate(sdk_present),
            )
            .unwrap();

        let result = registry.validate("wasi-make-debug").unwrap();
        assert!(!result.valid);
        assert!(result.hints[0].contains("not installed"));
        assert!(result.hints[0].contains("install"));
    }

    #[test]
    fn test_validate_is_pure() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());
        registry
            .register(
                ConfigDescriptor::new("wasi")
                    .platform(TargetPlatform::Wasi)
                    .validate(sdk_present),
            )
            .unwrap();

        let first = registry.validate("wasi").unwrap();
        let second = registry.validate("wasi").unwrap();
        assert_eq!(first, second);

        std::fs::create_dir_all(dir.path().join("wasi-sdk")).unwrap();
        let third = registry.validate("wasi").unwrap();
        assert!(third.valid);
        assert_eq!(third, registry.validate("wasi").unwrap());
    }

    #[test]
    fn test_validate_inherited_by_derived() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());
        registry
            .register(
                ConfigDescriptor::new("wasi")
                    .platform(TargetPlatform::Wasi)
                    .validate(sdk_present)
                    .hidden(),
            )
            .unwrap();
        registry
            .register(ConfigDescriptor::derive("wasi-make-debug", "wasi"))
            .unwrap();

        assert!(!registry.validate("wasi-make-debug").unwrap().valid);
        let visible: Vec<_> = registry.visible().map(|r| r.name.clone()).collect();
        assert_eq!(visible, vec!["wasi-make-debug"]);
    }

    #[test]
    fn test_no_predicate_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry(dir.path());
        registry
            .register(ConfigDescriptor::new("native").platform(TargetPlatform::Native))
            .unwrap();
        assert_eq!(registry.validate("native").unwrap(), Validation::ok());
    }
}
