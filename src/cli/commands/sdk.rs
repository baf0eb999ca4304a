use console::style;

use crate::error::Result;
use crate::host::Host;

pub async fn execute(host: &Host, name: Option<String>, args: Vec<String>) -> Result<()> {
    let Some(name) = name else {
        println!("{}", style("SDK commands").bold().cyan());
        println!();
        for command in host.command_names() {
            println!("  crossenv sdk {} <install|update|uninstall|list>", style(command).cyan());
        }
        return Ok(());
    };

    host.run_command(&name, &args).await
}
