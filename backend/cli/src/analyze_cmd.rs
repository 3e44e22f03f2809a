//! `tagscan analyze`: load config, run the pipeline, print the record.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use tracing::info;

use tagscan_config::{load_and_prepare, validate, TagScanConfig};
use tagscan_core::TagScanError;
use tagscan_logging::init_logger;
use tagscan_media::load_image;
use tagscan_pipeline::{InspectionPipeline, PipelineError};

use crate::display::render_summary;
use crate::terminal_output::{note_error, note_warn};

/// Load, substitute, default and validate the config; refuse to run on errors.
pub async fn prepared_config(config_path: &Path) -> Result<TagScanConfig> {
    let config = load_and_prepare(config_path).await?;
    let report = validate(&config);
    for warning in &report.warnings {
        note_warn(&warning.to_string());
    }
    if !report.is_valid() {
        for error in &report.errors {
            note_error(&error.to_string());
        }
        return Err(TagScanError::ConfigError(format!(
            "{} error(s) in {}",
            report.errors.len(),
            config_path.display()
        ))
        .into());
    }
    Ok(config)
}

/// Resolves when the user presses Ctrl-C. If the handler cannot be
/// installed, never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub async fn run(config_path: &Path, image_path: &Path, pretty: bool, summary: bool) -> Result<()> {
    let config = prepared_config(config_path).await?;
    let logging = config.logging();
    init_logger(logging.dir_or_default(), logging.level_or_default());

    let pipeline = InspectionPipeline::from_config(&config)?;
    let image = load_image(image_path, config.pipeline().image_limit())
        .await
        .map_err(|e| TagScanError::ImageRejected(e.to_string()))?;

    info!(image = %image_path.display(), "Analyzing tag image");

    let analysis = match pipeline.analyze_until(image, interrupted()).await {
        Ok(analysis) => analysis,
        Err(PipelineError::Cancelled) => bail!(TagScanError::Cancelled),
        Err(e) => return Err(TagScanError::from(e).into()),
    };

    if summary {
        let today = Local::now().date_naive();
        print!(
            "{}",
            render_summary(&analysis, today, config.pipeline().due_soon_window())
        );
    } else {
        let json = if pretty {
            serde_json::to_string_pretty(&analysis.record)
        } else {
            serde_json::to_string(&analysis.record)
        }
        .context("Failed to serialize record")?;
        println!("{json}");
    }
    Ok(())
}
