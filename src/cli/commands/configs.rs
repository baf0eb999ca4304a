use console::style;

use crate::error::Result;
use crate::host::Host;

pub async fn execute(host: &Host, all: bool) -> Result<()> {
    let records: Vec<_> = if all {
        host.configs().records().collect()
    } else {
        host.configs().visible().collect()
    };

    if records.is_empty() {
        println!("{}", style("No configurations registered.").dim());
        return Ok(());
    }

    println!("{}", style("Configurations").bold().cyan());
    println!();
    println!(
        "  {:<28} {:<11} {:<12} {:<8} {:<10}",
        style("NAME").dim(),
        style("PLATFORM").dim(),
        style("GENERATOR").dim(),
        style("MODE").dim(),
        style("RUNNER").dim()
    );

    for record in records {
        let validation = host.validate(&record.name)?;
        let marker = if validation.valid {
            style("✓").green()
        } else {
            style("✗").red()
        };
        let name = if record.hidden {
            style(record.name.as_str()).dim()
        } else {
            style(record.name.as_str()).white()
        };

        println!(
            "{} {:<28} {:<11} {:<12} {:<8} {:<10}",
            marker,
            name,
            record.platform.to_string(),
            record.generator.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string()),
            record.build_mode.to_string(),
            record.runner.as_deref().unwrap_or("-")
        );
        for hint in &validation.hints {
            println!("    {} {}", style("→").yellow(), style(hint).dim());
        }
    }

    Ok(())
}
