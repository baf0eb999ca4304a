use std::sync::Arc;

use async_trait::async_trait;
use console::style;

use crate::error::{CrossenvError, Result};
use crate::project_config::Project;
use crate::sdk::{LifecycleOutcome, SdkLifecycleManager, SdkState};

/// A `crossenv sdk <name> ...` subcommand contributed by a plugin.
#[async_trait]
pub trait PluginCommand: Send + Sync {
    fn name(&self) -> &str;

    /// Static usage text.
    fn help(&self) -> String;

    async fn run(&self, project: &Project, args: &[String]) -> Result<()>;
}

/// Routes `install | update | uninstall | list` to an SDK's lifecycle.
pub struct SdkCommand {
    manager: Arc<SdkLifecycleManager>,
    /// User-configured version, preferred over the descriptor's.
    default_version: Option<String>,
}

impl SdkCommand {
    pub fn new(manager: Arc<SdkLifecycleManager>, default_version: Option<String>) -> Self {
        Self {
            manager,
            default_version,
        }
    }

    fn command(&self) -> &str {
        &self.manager.descriptor().command
    }

    fn usage_error(&self, message: impl Into<String>) -> CrossenvError {
        CrossenvError::usage(
            message,
            format!("run 'crossenv sdk {} help'", self.command()),
        )
    }

    fn no_more_args(&self, sub: &str, rest: &[String]) -> Result<()> {
        match rest.first() {
            Some(extra) => Err(self.usage_error(format!(
                "Unexpected argument '{}' for '{}'",
                extra, sub
            ))),
            None => Ok(()),
        }
    }

    fn report(&self, outcome: LifecycleOutcome, done: &str) {
        match outcome {
            LifecycleOutcome::Done => {
                println!(
                    "{} {} {}",
                    style("✓").green().bold(),
                    style(self.manager.name()).cyan(),
                    done
                );
            }
            LifecycleOutcome::NothingToDo => {
                println!(
                    "{} {} is not installed, nothing to do",
                    style("!").yellow().bold(),
                    self.manager.name()
                );
            }
            LifecycleOutcome::Cancelled => {
                println!("{}", style("Cancelled.").dim());
            }
        }
    }

    async fn list(&self) -> Result<()> {
        let status = self.manager.status();
        let version = self
            .default_version
            .as_deref()
            .unwrap_or(&status.default_version);

        println!("{}", style(&status.name).bold().cyan());
        let installed = status.state == SdkState::Installed;
        println!(
            "  State:           {}",
            if installed {
                style(status.state).green()
            } else {
                style(status.state).dim()
            }
        );
        println!("  Directory:       {}", style(status.dir.display()).dim());
        println!("  Default version: {}", style(version).white());

        if installed && self.manager.descriptor().is_repository() {
            println!();
            self.manager.list_versions().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PluginCommand for SdkCommand {
    fn name(&self) -> &str {
        self.command()
    }

    fn help(&self) -> String {
        let name = self.manager.name();
        let command = self.command();
        let default = self
            .default_version
            .as_deref()
            .unwrap_or(&self.manager.descriptor().default_version);

        let mut help = format!(
            "Manage {name}\n\n\
             Usage: crossenv sdk {command} <subcommand>\n\n\
             Subcommands:\n  \
             install [version]   Install {name} (default: {default})\n"
        );
        if self.manager.descriptor().is_repository() {
            help.push_str("  update [--force]    Sync with upstream, discarding local changes\n");
        }
        help.push_str("  uninstall           Remove the SDK directory\n");
        help.push_str("  list                Show install state and available versions\n");
        help
    }

    async fn run(&self, _project: &Project, args: &[String]) -> Result<()> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(self.usage_error(format!(
                "Missing subcommand for 'crossenv sdk {}'",
                self.command()
            )));
        };

        match sub.as_str() {
            "install" => {
                if rest.len() > 1 {
                    self.no_more_args(sub, &rest[1..])?;
                }
                let version = rest
                    .first()
                    .map(String::as_str)
                    .or(self.default_version.as_deref());
                let outcome = self.manager.install(version).await?;
                self.report(outcome, "installed");
            }
            "update" => {
                let force = match rest {
                    [] => false,
                    [flag] if flag == "--force" || flag == "-f" => true,
                    _ => return Err(self.usage_error(format!("Unexpected argument '{}' for 'update'", rest[0]))),
                };
                let outcome = self.manager.update(force).await?;
                self.report(outcome, "updated");
            }
            "uninstall" => {
                self.no_more_args(sub, rest)?;
                let outcome = self.manager.uninstall().await?;
                self.report(outcome, "uninstalled");
            }
            "list" => {
                self.no_more_args(sub, rest)?;
                self.list().await?;
            }
            "help" | "--help" | "-h" => println!("{}", self.help()),
            other => {
                return Err(self.usage_error(format!(
                    "Unknown subcommand '{}' for 'crossenv sdk {}'",
                    other,
                    self.command()
                )))
            }
        }

        Ok(())
    }
}
