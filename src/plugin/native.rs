use std::sync::Arc;

use super::{register_variants, BuildContext, Plugin, Registrar};
use crate::configs::{ConfigDescriptor, Generator, TargetPlatform};
use crate::error::Result;
use crate::probe::ToolProbe;
use crate::runner::DirectRunner;

/// Host builds with the system compiler; nothing to install.
pub struct NativePlugin;

impl Plugin for NativePlugin {
    fn name(&self) -> &str {
        "native"
    }

    fn platform(&self) -> TargetPlatform {
        TargetPlatform::Native
    }

    fn configure(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        registrar.probe(ToolProbe::new("cmake", "install CMake from https://cmake.org/download/"));
        registrar.probe(
            ToolProbe::new("ninja", "install Ninja from https://ninja-build.org/").optional(),
        );

        let runner = DirectRunner::native(registrar.probes(), registrar.services().process.clone());
        registrar.runner("native", Arc::new(runner));

        registrar.config(
            ConfigDescriptor::new("native")
                .platform(TargetPlatform::Native)
                .runner("native")
                .hidden(),
        )?;
        register_variants(registrar, "native", &[Generator::Make, Generator::Ninja])
    }

    fn build(&self, _ctx: &mut BuildContext<'_>) -> Result<()> {
        Ok(())
    }
}
