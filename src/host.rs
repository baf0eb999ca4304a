//! The host: everything one crossenv invocation works with.
//!
//! ```text
//! plugins.configure ──► ProbeRegistry / ConfigRegistry / RunnerDispatch / sdk commands
//! crossenv.yaml configs ──► ConfigRegistry (registered last, so they win)
//! flags <config> ──► validate ──► owning plugin's build ──► BuildFlags
//! run <config>   ──► config.runner ──► RunnerDispatch
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::configs::{ConfigRegistry, ConfigurationRecord, Validation, ValidationEnv};
use crate::error::{CrossenvError, Result};
use crate::platform::HostPlatform;
use crate::plugin::{self, BuildContext, BuildFlags, Plugin, PluginCommand, Registrar};
use crate::probe::ProbeRegistry;
use crate::project_config::Project;
use crate::runner::{RunOptions, RunnerDispatch, Target, TargetKind};
use crate::services::Services;

pub struct Host {
    app: AppConfig,
    project: Project,
    platform: HostPlatform,
    probes: Arc<ProbeRegistry>,
    configs: ConfigRegistry,
    runners: RunnerDispatch,
    commands: BTreeMap<String, Arc<dyn PluginCommand>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Host {
    /// Host with the built-in plugins.
    pub fn new(
        app: AppConfig,
        project: Project,
        services: Services,
        platform: HostPlatform,
    ) -> Result<Self> {
        Self::with_plugins(app, project, services, platform, plugin::builtin())
    }

    pub fn with_plugins(
        app: AppConfig,
        project: Project,
        services: Services,
        platform: HostPlatform,
        plugins: Vec<Box<dyn Plugin>>,
    ) -> Result<Self> {
        let probes = Arc::new(ProbeRegistry::new(services.process.clone(), platform));
        let mut configs = ConfigRegistry::new(ValidationEnv::new(app.sdk_root()?, platform));
        let mut runners = RunnerDispatch::new();
        let mut commands = BTreeMap::new();

        for plugin in &plugins {
            let mut registrar = Registrar::new(
                &probes,
                &mut configs,
                &mut runners,
                &mut commands,
                &services,
                &app,
            );
            plugin.configure(&mut registrar)?;
            tracing::debug!("Configured plugin {}", plugin.name());
        }

        for entry in &project.config.configs {
            configs.register(entry.to_descriptor())?;
            tracing::debug!("Project configuration {} registered", entry.name);
        }

        Ok(Self {
            app,
            project,
            platform,
            probes,
            configs,
            runners,
            commands,
            plugins,
        })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn probes(&self) -> &ProbeRegistry {
        &self.probes
    }

    pub fn configs(&self) -> &ConfigRegistry {
        &self.configs
    }

    pub fn runners(&self) -> &RunnerDispatch {
        &self.runners
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn command(&self, name: &str) -> Result<&Arc<dyn PluginCommand>> {
        self.commands
            .get(name)
            .ok_or_else(|| CrossenvError::UnknownPlugin {
                name: name.to_string(),
                available: self.command_names(),
            })
    }

    /// `crossenv sdk <name> args...`
    pub async fn run_command(&self, name: &str, args: &[String]) -> Result<()> {
        self.command(name)?.run(&self.project, args).await
    }

    pub fn validate(&self, config: &str) -> Result<Validation> {
        self.configs.validate(config)
    }

    /// Compiler and linker inputs for `config`, refusing unusable ones.
    pub fn build_flags(&self, config: &str) -> Result<BuildFlags> {
        let record = self.usable(config)?;

        let plugin = self
            .plugins
            .iter()
            .find(|p| p.platform() == record.platform)
            .ok_or_else(|| CrossenvError::UnsupportedPlatform {
                what: format!("Building '{}'", record.name),
                platform: record.platform.to_string(),
            })?;

        let mut ctx = BuildContext::new(&self.project, &record, self.platform);
        plugin.build(&mut ctx)?;
        Ok(ctx.finish())
    }

    /// Runs a built executable with `config`'s runner.
    pub async fn run(&self, config: &str, target: &Target, options: &RunOptions) -> Result<()> {
        if target.kind != TargetKind::Executable {
            return Err(CrossenvError::usage(
                format!(
                    "'{}' is a {}, only executables can be run",
                    target.artifact.display(),
                    target.kind
                ),
                "pass the path of an executable artifact",
            ));
        }

        let record = self.usable(config)?;
        let runner = record
            .runner
            .as_deref()
            .ok_or_else(|| CrossenvError::IncompleteConfig {
                name: record.name.clone(),
                field: "runner".to_string(),
            })?;

        self.runners
            .run(runner, &self.project, &record, target, options)
            .await
    }

    fn usable(&self, config: &str) -> Result<Arc<ConfigurationRecord>> {
        let record = self.configs.resolve(config)?;
        let validation = self.configs.validate(config)?;
        if !validation.valid {
            return Err(CrossenvError::InvalidConfig {
                name: record.name.clone(),
                hints: validation.hints,
            });
        }
        Ok(record)
    }
}
