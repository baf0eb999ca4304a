//! WASI builds with wasi-sdk, run with wasmtime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{register_variants, sdk_installed, BuildContext, Plugin, Registrar};
use crate::configs::{ConfigDescriptor, Generator, TargetPlatform};
use crate::error::{CrossenvError, Result};
use crate::probe::ToolProbe;
use crate::runner::DirectRunner;
use crate::sdk::{SdkDescriptor, SdkSource};

pub const SDK_NAME: &str = "wasi-sdk";
pub const COMMAND: &str = "wasi";
pub const DEFAULT_VERSION: &str = "25.0";
pub const RUNTIME: &str = "wasmtime";

const URL_TEMPLATE: &str = "https://github.com/WebAssembly/wasi-sdk/releases/download/wasi-sdk-{major}/wasi-sdk-{version}-{arch}-{os}.tar.gz";
const EXTRACTED_DIR_TEMPLATE: &str = "wasi-sdk-{version}-{arch}-{os}";
const TOOLCHAIN_FILE: &str = "share/cmake/wasi-sdk.cmake";

/// WebAssembly page size; memory sizes must be a multiple of it.
const WASM_PAGE: u64 = 65536;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecModel {
    /// `_start` runs once, then the instance is done
    #[default]
    Command,
    /// Exports stay callable after `_initialize`
    Reactor,
}

/// `wasi:` section of crossenv.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WasiOptions {
    /// Initial linear memory in bytes (toolchain default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_memory: Option<u64>,
    /// Stack size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<u64>,
    #[serde(default)]
    pub exec_model: ExecModel,
    /// C++ exceptions, off by default
    #[serde(default)]
    pub exceptions: bool,
}

impl WasiOptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(memory) = self.initial_memory {
            if memory == 0 || memory % WASM_PAGE != 0 {
                return Err(CrossenvError::Config(format!(
                    "wasi.initial_memory must be a positive multiple of {} (got {})",
                    WASM_PAGE, memory
                )));
            }
        }
        if self.stack_size == Some(0) {
            return Err(CrossenvError::Config(
                "wasi.stack_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn sdk_descriptor() -> SdkDescriptor {
    SdkDescriptor {
        name: SDK_NAME.to_string(),
        default_version: DEFAULT_VERSION.to_string(),
        source: SdkSource::Archive {
            url_template: URL_TEMPLATE.to_string(),
            extracted_dir_template: EXTRACTED_DIR_TEMPLATE.to_string(),
        },
        command: COMMAND.to_string(),
    }
}

pub struct WasiPlugin;

impl Plugin for WasiPlugin {
    fn name(&self) -> &str {
        COMMAND
    }

    fn platform(&self) -> TargetPlatform {
        TargetPlatform::Wasi
    }

    fn configure(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        registrar.probe(ToolProbe::new("tar", "install tar with your system package manager"));
        registrar.probe(ToolProbe::new(
            RUNTIME,
            "curl https://wasmtime.dev/install.sh -sSf | bash",
        ));

        let sdk = registrar.sdk_command(sdk_descriptor());

        let runner = DirectRunner::with_runtime(RUNTIME, registrar.probes(), registrar.services().process.clone())
            .runtime_args(&["run", "--dir=."]);
        registrar.runner(RUNTIME, Arc::new(runner));

        registrar.config(
            ConfigDescriptor::new("wasi")
                .platform(TargetPlatform::Wasi)
                .runner(RUNTIME)
                .toolchain_file(sdk.path(TOOLCHAIN_FILE))
                .validate(sdk_installed(SDK_NAME, COMMAND))
                .hidden(),
        )?;
        register_variants(registrar, "wasi", &[Generator::Make, Generator::Ninja])
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.include_toolchain_file()?;

        let options = &ctx.project.config.wasi;
        let flags = &mut ctx.flags;

        if let Some(sdk) = ctx.config.toolchain_file().and_then(|f| f.ancestors().nth(3)) {
            flags.define("WASI_SDK_PREFIX", sdk.display().to_string());
        }
        if let Some(memory) = options.initial_memory {
            flags.link(format!("-Wl,--initial-memory={}", memory));
        }
        if let Some(stack) = options.stack_size {
            flags.link(format!("-Wl,-z,stack-size={}", stack));
        }
        if options.exec_model == ExecModel::Reactor {
            flags.link("-mexec-model=reactor");
        }
        if options.exceptions {
            flags.both("-fwasm-exceptions");
        } else {
            flags.compile("-fno-exceptions");
        }
        Ok(())
    }
}
