//! Toolchain plugins.
//!
//! Each plugin is configured once at startup through a [`Registrar`], which
//! hands it the host's registries and capability handles instead of letting
//! it reach into global state. During a build the host calls the plugin that
//! owns the active configuration's platform with a [`BuildContext`].

pub mod command;
pub mod emscripten;
pub mod ios;
pub mod native;
pub mod wasi;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::configs::{
    BuildMode, ConfigDescriptor, ConfigRegistry, ConfigurationRecord, Generator, Opener,
    TargetPlatform, Validation, ValidationEnv,
};
use crate::error::{CrossenvError, Result};
use crate::platform::HostPlatform;
use crate::probe::{ProbeRegistry, ToolProbe};
use crate::project_config::Project;
use crate::runner::{Runner, RunnerDispatch};
use crate::sdk::{SdkDescriptor, SdkLifecycleManager};
use crate::services::Services;

pub use command::{PluginCommand, SdkCommand};

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Platform whose configurations this plugin builds.
    fn platform(&self) -> TargetPlatform;

    /// Registers probes, runners, commands and configurations. Called once.
    fn configure(&self, registrar: &mut Registrar<'_>) -> Result<()>;

    /// Adds this plugin's flags for the active configuration.
    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()>;
}

/// The built-in plugins, in registration order.
pub fn builtin() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(native::NativePlugin),
        Box::new(wasi::WasiPlugin),
        Box::new(emscripten::EmscriptenPlugin),
        Box::new(ios::IosPlugin),
    ]
}

/// Registration surface handed to [`Plugin::configure`].
pub struct Registrar<'a> {
    probes: &'a Arc<ProbeRegistry>,
    configs: &'a mut ConfigRegistry,
    runners: &'a mut RunnerDispatch,
    commands: &'a mut BTreeMap<String, Arc<dyn PluginCommand>>,
    services: &'a Services,
    app: &'a AppConfig,
    sdk_root: PathBuf,
}

impl<'a> Registrar<'a> {
    pub fn new(
        probes: &'a Arc<ProbeRegistry>,
        configs: &'a mut ConfigRegistry,
        runners: &'a mut RunnerDispatch,
        commands: &'a mut BTreeMap<String, Arc<dyn PluginCommand>>,
        services: &'a Services,
        app: &'a AppConfig,
    ) -> Self {
        let sdk_root = configs.env().sdk_root.clone();
        Self {
            probes,
            configs,
            runners,
            commands,
            services,
            app,
            sdk_root,
        }
    }

    pub fn host(&self) -> HostPlatform {
        self.probes.host()
    }

    pub fn app_config(&self) -> &AppConfig {
        self.app
    }

    pub fn services(&self) -> &Services {
        self.services
    }

    pub fn probes(&self) -> Arc<ProbeRegistry> {
        self.probes.clone()
    }

    pub fn probe(&mut self, probe: ToolProbe) {
        self.probes.register(probe);
    }

    pub fn config(&mut self, descriptor: ConfigDescriptor) -> Result<Arc<ConfigurationRecord>> {
        self.configs.register(descriptor)
    }

    pub fn runner(&mut self, name: impl Into<String>, runner: Arc<dyn Runner>) {
        self.runners.register(name, runner);
    }

    /// Registers `crossenv sdk <name>`; a later command with the same name
    /// replaces it.
    pub fn command(&mut self, command: Arc<dyn PluginCommand>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Lifecycle manager for an SDK under the shared root.
    pub fn sdk(&self, descriptor: SdkDescriptor) -> Arc<SdkLifecycleManager> {
        Arc::new(SdkLifecycleManager::new(
            descriptor,
            &self.sdk_root,
            self.probes.clone(),
            self.services.clone(),
        ))
    }

    /// Registers the SDK's subcommand and returns its manager.
    pub fn sdk_command(&mut self, descriptor: SdkDescriptor) -> Arc<SdkLifecycleManager> {
        let default_version = self.app.default_version(&descriptor.name).map(str::to_string);
        let manager = self.sdk(descriptor);
        self.command(Arc::new(SdkCommand::new(manager.clone(), default_version)));
        manager
    }
}

/// Registers `<base>-<generator>-<mode>` for every generator and build mode.
pub(crate) fn register_variants(
    registrar: &mut Registrar<'_>,
    base: &str,
    generators: &[Generator],
) -> Result<()> {
    for generator in generators {
        for mode in [BuildMode::Debug, BuildMode::Release] {
            registrar.config(
                ConfigDescriptor::derive(format!("{}-{}-{}", base, generator, mode), base)
                    .generator(*generator)
                    .build_mode(mode),
            )?;
        }
    }
    Ok(())
}

/// Validation predicate: the SDK directory exists under the root.
pub fn sdk_installed(
    sdk: &str,
    command: &str,
) -> impl Fn(&ValidationEnv) -> Validation + Send + Sync + 'static {
    let sdk = sdk.to_string();
    let command = command.to_string();
    move |env| {
        if env.sdk_dir(&sdk).is_dir() {
            Validation::ok()
        } else {
            Validation::invalid(format!(
                "{} is not installed (run 'crossenv sdk {} install')",
                sdk, command
            ))
        }
    }
}

/// Compiler, linker and CMake inputs for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildFlags {
    pub compile: Vec<String>,
    pub link: Vec<String>,
    pub defines: BTreeMap<String, String>,
    /// Build-file fragments to include, toolchain file first.
    pub include: Vec<PathBuf>,
    /// What to open once the build tree is generated.
    pub opener: Opener,
}

impl BuildFlags {
    pub fn compile(&mut self, flag: impl Into<String>) {
        self.compile.push(flag.into());
    }

    pub fn link(&mut self, flag: impl Into<String>) {
        self.link.push(flag.into());
    }

    /// Adds a flag to both compile and link lines.
    pub fn both(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        self.compile.push(flag.clone());
        self.link.push(flag);
    }

    pub fn define(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.defines.insert(key.into(), value.into());
    }
}

/// What [`Plugin::build`] reads and writes.
pub struct BuildContext<'a> {
    pub project: &'a Project,
    pub config: &'a ConfigurationRecord,
    pub host: HostPlatform,
    pub flags: BuildFlags,
}

impl<'a> BuildContext<'a> {
    /// Starts with the defines every configuration carries: build type,
    /// generator and the configuration's variables.
    pub fn new(project: &'a Project, config: &'a ConfigurationRecord, host: HostPlatform) -> Self {
        let mut flags = BuildFlags {
            opener: config.opener,
            ..Default::default()
        };
        flags.define("CMAKE_BUILD_TYPE", config.build_mode.cmake_build_type());
        if let Some(generator) = config.generator {
            flags.define("CMAKE_GENERATOR", generator.cmake_name(host.os));
        }
        for (key, value) in &config.variables {
            flags.define(key, value.to_string());
        }

        Self {
            project,
            config,
            host,
            flags,
        }
    }

    /// Includes the configuration's toolchain file, which must exist.
    pub fn include_toolchain_file(&mut self) -> Result<()> {
        let Some(path) = self.config.toolchain_file() else {
            return Ok(());
        };

        if !path.is_file() {
            return Err(CrossenvError::MissingBuildFile {
                path: path.to_path_buf(),
            });
        }

        self.flags
            .define("CMAKE_TOOLCHAIN_FILE", path.display().to_string());
        self.flags.include.push(path.to_path_buf());
        Ok(())
    }

    pub fn finish(self) -> BuildFlags {
        self.flags
    }
}
