use console::style;

use crate::configs::Opener;
use crate::error::Result;
use crate::host::Host;

pub async fn execute(host: &Host, config: &str, json: bool) -> Result<()> {
    let flags = host.build_flags(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&flags)?);
        return Ok(());
    }

    println!("{}", style(config).bold().cyan());
    println!();
    for (key, value) in &flags.defines {
        println!("  -D{}={}", key, value);
    }
    if !flags.compile.is_empty() {
        println!("  {} {}", style("compile:").dim(), flags.compile.join(" "));
    }
    if !flags.link.is_empty() {
        println!("  {} {}", style("link:").dim(), flags.link.join(" "));
    }
    for include in &flags.include {
        println!("  {} {}", style("include:").dim(), include.display());
    }
    if flags.opener == Opener::Ide {
        println!(
            "  {} IDE project in {}",
            style("open:").dim(),
            host.project().config_build_dir(config).display()
        );
    }

    Ok(())
}
