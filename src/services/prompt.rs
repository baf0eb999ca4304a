use console::style;
use dialoguer::Confirm;

use super::Prompt;
use crate::error::Result;

/// Interactive terminal confirmation.
pub struct DialoguerPrompt;

impl Prompt for DialoguerPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        let confirmed = Confirm::new()
            .with_prompt(format!("  {} {}", style("?").cyan().bold(), message))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Answers yes to everything (`--yes`).
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, message: &str) -> Result<bool> {
        tracing::debug!("Auto-confirmed: {}", message);
        Ok(true)
    }
}
