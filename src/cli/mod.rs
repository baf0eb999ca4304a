pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::error::Result;
use crate::host::Host;
use crate::platform::HostPlatform;
use crate::project_config::Project;
use crate::services::Services;

#[derive(Parser)]
#[command(name = "crossenv")]
#[command(version)]
#[command(about = "Cross-compilation toolchains, build configurations and runners")]
#[command(long_about = "Install WASI and Emscripten SDKs, compose build configurations from them,\nand run the artifacts you build with the right runtime.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage an SDK (install, update, uninstall, list)
    Sdk {
        /// SDK command (e.g. wasi, emscripten); lists them when omitted
        name: Option<String>,

        /// Subcommand and its arguments; -y and -v are still global here
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List build configurations and whether they are usable
    Configs {
        /// Include hidden base configurations
        #[arg(short, long)]
        all: bool,
    },

    /// Check the external tools plugins depend on
    Probes,

    /// Print compiler and linker flags for a configuration
    Flags {
        /// Configuration name
        config: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a built executable with its configuration's runner
    Run {
        /// Configuration name
        config: String,

        /// Path of the built executable
        artifact: PathBuf,

        /// Arguments passed to the executable
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (sdk_root, server_port, browser, default_versions.<sdk>)
        key: String,
        /// Configuration value; empty clears optional keys
        value: String,
    },
}

impl Cli {
    /// Parses the process arguments.
    pub fn parse_args() -> Self {
        Self::parse().hoist_global_flags()
    }

    /// `sdk` arguments are taken verbatim, so global flags typed after the
    /// SDK subcommand land there; move them back.
    fn hoist_global_flags(mut self) -> Self {
        if let Commands::Sdk { ref mut args, .. } = self.command {
            args.retain(|arg| match arg.as_str() {
                "-y" | "--yes" => {
                    self.yes = true;
                    false
                }
                "-v" | "--verbose" => {
                    self.verbose = true;
                    false
                }
                _ => true,
            });
        }
        self
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Sdk { name, args } => {
                let host = load_host(self.yes)?;
                commands::sdk::execute(&host, name, args).await
            }
            Commands::Configs { all } => {
                let host = load_host(self.yes)?;
                commands::configs::execute(&host, all).await
            }
            Commands::Probes => {
                let host = load_host(self.yes)?;
                commands::probes::execute(&host).await
            }
            Commands::Flags { config, json } => {
                let host = load_host(self.yes)?;
                commands::flags::execute(&host, &config, json).await
            }
            Commands::Run {
                config,
                artifact,
                args,
            } => {
                let host = load_host(self.yes)?;
                commands::run::execute(&host, &config, artifact, args).await
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => commands::config::show().await,
                ConfigCommands::Set { key, value } => commands::config::set(key, value).await,
            },
        }
    }
}

fn load_host(assume_yes: bool) -> Result<Host> {
    let app = AppConfig::load()?;
    let cwd = std::env::current_dir()?;
    let project = Project::discover(&cwd)?;
    tracing::debug!("Project root: {}", project.root.display());

    Host::new(app, project, Services::system(assume_yes), HostPlatform::detect()?)
}
