//! `tagscan config`: show, validate or create the config file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use tagscan_config::{apply_all_defaults, load_and_prepare, redact, validate, write_config, TagScanConfig};

use crate::terminal_output::{note_error, note_success, note_warn};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Check the effective config and report problems
    Validate,
    /// Write a config file populated with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(config_path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_and_prepare(config_path).await?;
            let value = serde_json::to_value(&config).context("Failed to serialize config")?;
            println!("{}", serde_json::to_string_pretty(&redact(&value))?);
        }
        ConfigAction::Validate => {
            let config = load_and_prepare(config_path).await?;
            let report = validate(&config);
            for warning in &report.warnings {
                note_warn(&warning.to_string());
            }
            for error in &report.errors {
                note_error(&error.to_string());
            }
            if !report.is_valid() {
                bail!("{} has {} error(s)", config_path.display(), report.errors.len());
            }
            note_success(&format!("{} is valid", config_path.display()));
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    config_path.display()
                );
            }
            write_config(&apply_all_defaults(TagScanConfig::default()), config_path).await?;
            note_success(&format!("Wrote {}", config_path.display()));
        }
    }
    Ok(())
}
