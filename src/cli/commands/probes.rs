use console::style;

use crate::error::Result;
use crate::host::Host;

pub async fn execute(host: &Host) -> Result<()> {
    let results = host.probes().check_all().await;

    println!(
        "{} {}",
        style("External tools on").bold().cyan(),
        style(host.platform()).bold().cyan()
    );
    println!();

    for (probe, result) in &results {
        if result.available {
            println!("  {} {}", style("✓").green(), probe.name);
            continue;
        }

        let marker = if probe.optional {
            style("-").dim()
        } else {
            style("✗").red()
        };
        let label = if probe.optional { " (optional)" } else { "" };
        println!("  {} {}{}", marker, probe.name, style(label).dim());
        if !probe.not_found_message.is_empty() {
            println!("      {}", style(&probe.not_found_message).dim());
        }
    }

    Ok(())
}
