use console::style;

use crate::config::AppConfig;
use crate::error::Result;

pub async fn show() -> Result<()> {
    let config_path = AppConfig::config_path()?;
    let config = AppConfig::load()?;

    println!("{}", style("Current Configuration").bold().cyan());
    println!();
    println!("  SDK root:     {}", style(&config.sdk_root).white());
    println!("  Server port:  {}", style(config.server_port).yellow());
    print!("  Browser:      ");
    match &config.browser {
        Some(b) => println!("{}", style(b).white()),
        None => println!("{}", style("(system default)").dim()),
    }
    if config.default_versions.is_empty() {
        println!("  Versions:     {}", style("(SDK defaults)").dim());
    } else {
        println!("  Versions:");
        for (sdk, version) in &config.default_versions {
            println!("    {:<12} {}", sdk, style(version).white());
        }
    }
    println!();
    if config_path.exists() {
        println!("Config file: {}", style(config_path.display()).dim());
    } else {
        println!(
            "{} {}",
            style("No config file yet, showing defaults:").dim(),
            style(config_path.display()).dim()
        );
    }

    Ok(())
}

pub async fn set(key: String, value: String) -> Result<()> {
    // Without env overrides, so they never end up in the file.
    let mut config = AppConfig::load_from(&AppConfig::config_path()?)?;

    config.set(&key, &value)?;
    config.save()?;

    println!(
        "{} Set {} = {}",
        style("✓").green().bold(),
        style(&key).cyan(),
        style(&value).white()
    );

    Ok(())
}
