use std::sync::Arc;

use super::{register_variants, BuildContext, Plugin, Registrar};
use crate::configs::{
    ConfigDescriptor, Generator, Opener, TargetPlatform, Validation, ValidationEnv,
};
use crate::error::Result;
use crate::platform::HostOs;
use crate::probe::ToolProbe;
use crate::runner::{HarnessRunner, Launcher};

const SIMULATOR: &str = "ios-sim";

fn requires_macos(env: &ValidationEnv) -> Validation {
    if env.host.os == HostOs::Macos {
        Validation::ok()
    } else {
        Validation::invalid(format!(
            "iOS builds need Xcode on macOS (this host is {})",
            env.host
        ))
    }
}

/// iOS builds through Xcode; Apple hosts only.
pub struct IosPlugin;

impl Plugin for IosPlugin {
    fn name(&self) -> &str {
        "ios"
    }

    fn platform(&self) -> TargetPlatform {
        TargetPlatform::Ios
    }

    fn configure(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        registrar.probe(
            ToolProbe::new("xcrun", "install Xcode and run 'xcode-select --install'")
                .on(&[HostOs::Macos])
                .version_args(&["--version"]),
        );
        registrar.probe(
            ToolProbe::new("xcodebuild", "install Xcode from the App Store")
                .on(&[HostOs::Macos])
                .version_args(&["-version"]),
        );
        registrar.probe(
            ToolProbe::new(SIMULATOR, "npm install -g ios-sim")
                .on(&[HostOs::Macos])
                .optional(),
        );

        let harness = HarnessRunner::new(
            SIMULATOR,
            Launcher::OnPath(SIMULATOR.to_string()),
            &["launch", "{artifact}"],
            registrar.probes(),
            registrar.services().process.clone(),
        );
        registrar.runner(SIMULATOR, Arc::new(harness));

        registrar.config(
            ConfigDescriptor::new("ios")
                .platform(TargetPlatform::Ios)
                .runner(SIMULATOR)
                .opener(Opener::Ide)
                .validate(requires_macos)
                .hidden(),
        )?;
        register_variants(registrar, "ios", &[Generator::IdeProject])
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        ctx.flags.define("CMAKE_SYSTEM_NAME", "iOS");
        ctx.flags.define("CMAKE_OSX_SYSROOT", "iphoneos");
        Ok(())
    }
}
