//! Emscripten builds with emsdk, run in a browser.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{register_variants, sdk_installed, BuildContext, Plugin, Registrar};
use crate::configs::{BuildMode, ConfigDescriptor, Generator, TargetPlatform};
use crate::error::{CrossenvError, Result};
use crate::platform::HostOs;
use crate::probe::ToolProbe;
use crate::runner::{BrowserRunner, HarnessRunner, Launcher};
use crate::sdk::{SdkDescriptor, SdkSource};

pub const SDK_NAME: &str = "emsdk";
pub const COMMAND: &str = "emscripten";
pub const REPOSITORY: &str = "https://github.com/emscripten-core/emsdk.git";
const TOOLCHAIN_FILE: &str = "upstream/emscripten/cmake/Modules/Platform/Emscripten.cmake";
const WASM_PAGE: u64 = 65536;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Allocator {
    #[default]
    Dlmalloc,
    Emmalloc,
    Mimalloc,
}

impl Allocator {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Dlmalloc => "dlmalloc",
            Self::Emmalloc => "emmalloc",
            Self::Mimalloc => "mimalloc",
        }
    }
}

/// `emscripten:` section of crossenv.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmscriptenOptions {
    /// Initial heap in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_memory: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocator: Option<Allocator>,
    #[serde(default)]
    pub allow_memory_growth: bool,
    #[serde(default)]
    pub exceptions: bool,
    /// Runtime assertions; on for debug builds when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertions: Option<bool>,
    /// Embed the wasm module in the generated JavaScript
    #[serde(default)]
    pub single_file: bool,
}

impl EmscriptenOptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(memory) = self.initial_memory {
            if memory == 0 || memory % WASM_PAGE != 0 {
                return Err(CrossenvError::Config(format!(
                    "emscripten.initial_memory must be a positive multiple of {} (got {})",
                    WASM_PAGE, memory
                )));
            }
        }
        if let Some(stack) = self.stack_size {
            if stack == 0 || stack % 16 != 0 {
                return Err(CrossenvError::Config(format!(
                    "emscripten.stack_size must be a positive multiple of 16 (got {})",
                    stack
                )));
            }
        }
        Ok(())
    }
}

pub fn sdk_descriptor(os: HostOs) -> SdkDescriptor {
    let tool = if os == HostOs::Windows { "emsdk.bat" } else { "emsdk" };
    SdkDescriptor {
        name: SDK_NAME.to_string(),
        default_version: "latest".to_string(),
        source: SdkSource::Repository {
            url: REPOSITORY.to_string(),
            reference: None,
            tool: tool.to_string(),
        },
        command: COMMAND.to_string(),
    }
}

pub struct EmscriptenPlugin;

impl Plugin for EmscriptenPlugin {
    fn name(&self) -> &str {
        COMMAND
    }

    fn platform(&self) -> TargetPlatform {
        TargetPlatform::Emscripten
    }

    fn configure(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        let host = registrar.host();
        registrar.probe(ToolProbe::new("git", "install git from https://git-scm.com/downloads"));
        registrar.probe(
            ToolProbe::new("python3", "emsdk needs Python 3: https://www.python.org/downloads/")
                .on(&[HostOs::Linux, HostOs::Macos]),
        );

        let sdk = registrar.sdk_command(sdk_descriptor(host.os));

        let app = registrar.app_config();
        let browser = BrowserRunner::new(app.server_port, app.browser.clone());
        registrar.runner("browser", Arc::new(browser));

        let emrun = if host.os == HostOs::Windows { "emrun.bat" } else { "emrun" };
        let harness = HarnessRunner::new(
            "emrun",
            Launcher::Bundled {
                path: sdk.path("upstream/emscripten").join(emrun),
                sdk: SDK_NAME.to_string(),
                command: COMMAND.to_string(),
            },
            &["--serve_root", "{dir}", "{file}"],
            registrar.probes(),
            registrar.services().process.clone(),
        );
        registrar.runner("emrun", Arc::new(harness));

        registrar.config(
            ConfigDescriptor::new("emscripten")
                .platform(TargetPlatform::Emscripten)
                .runner("browser")
                .toolchain_file(sdk.path(TOOLCHAIN_FILE))
                .validate(sdk_installed(SDK_NAME, COMMAND))
                .hidden(),
        )?;
        register_variants(registrar, "emscripten", &[Generator::Make, Generator::Ninja])
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.include_toolchain_file()?;

        let options = &ctx.project.config.emscripten;
        let debug = ctx.config.build_mode == BuildMode::Debug;
        let flags = &mut ctx.flags;

        if let Some(memory) = options.initial_memory {
            flags.link(format!("-sINITIAL_MEMORY={}", memory));
        }
        if let Some(stack) = options.stack_size {
            flags.link(format!("-sSTACK_SIZE={}", stack));
        }
        if let Some(allocator) = options.allocator {
            flags.link(format!("-sMALLOC={}", allocator.as_str()));
        }
        if options.allow_memory_growth {
            flags.link("-sALLOW_MEMORY_GROWTH=1");
        }
        if options.exceptions {
            flags.both("-fwasm-exceptions");
        }
        if options.assertions.unwrap_or(debug) {
            flags.link("-sASSERTIONS=1");
        }
        if options.single_file {
            flags.link("-sSINGLE_FILE=1");
        }
        Ok(())
    }
}
