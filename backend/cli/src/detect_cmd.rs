//! `tagscan detect`: report what the pipeline would see for a file.

use std::path::Path;

use anyhow::Result;

use tagscan_config::load_and_prepare;
use tagscan_core::TagScanError;
use tagscan_media::{detect_mime_type, is_image, load_image};

use crate::terminal_output::{note_success, note_warn};

pub async fn run(config_path: &Path, image_path: &Path) -> Result<()> {
    let limit = load_and_prepare(config_path).await?.pipeline().image_limit();
    let image = load_image(image_path, limit)
        .await
        .map_err(|e| TagScanError::ImageRejected(e.to_string()))?;

    note_success(&format!(
        "{}: {} ({} base64 chars)",
        image_path.display(),
        image.mime_type(),
        image.payload().len()
    ));

    let by_extension = detect_mime_type(image_path);
    if !is_image(by_extension) {
        note_warn(&format!("extension does not name an image type ({by_extension})"));
    } else if by_extension != image.mime_type() {
        note_warn(&format!(
            "extension suggests {by_extension}, content is {}",
            image.mime_type()
        ));
    }
    Ok(())
}
