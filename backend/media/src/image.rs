use std::fmt;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::mime_detect::sniff_format;

/// Base64 characters decoded when sniffing an already-encoded payload.
/// A multiple of four, so the prefix decodes without padding.
const SNIFF_PREFIX_CHARS: usize = 48;

/// Image formats the vision providers accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A self-describing handle on one tag photograph: base64 payload plus the
/// sniffed format. Immutable once built; every layer reads the same one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    format: ImageFormat,
    payload: String,
}

impl ImageReference {
    /// Build a reference from raw image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let format = sniff_format(bytes).unwrap_or_default();
        Self {
            format,
            payload: STANDARD.encode(bytes),
        }
    }

    /// Build a reference from an already base64-encoded payload.
    ///
    /// Only a short prefix is decoded to sniff the format. Undecodable or
    /// unrecognised input is labelled `jpeg`; this never fails.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        let mut payload: String = encoded.into();
        if let Some((_, data)) = payload.split_once(";base64,") {
            payload = data.to_string();
        }
        let payload = payload.trim().to_string();

        let prefix = &payload.as_bytes()[..payload.len().min(SNIFF_PREFIX_CHARS)];
        let prefix = &prefix[..prefix.len() - prefix.len() % 4];

        let format = match STANDARD.decode(prefix) {
            Ok(bytes) => sniff_format(&bytes).unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "Image prefix did not decode; assuming jpeg");
                ImageFormat::default()
            }
        };

        Self { format, payload }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// The base64 payload without any URI prefix.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// `data:image/<format>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.payload)
    }
}

/// Errors rejecting an input image before the pipeline runs.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image {0} is empty")]
    Empty(PathBuf),

    #[error("image {path} is {size} bytes, limit is {limit}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

/// Read an image file into a reference, enforcing the caller's size limit.
pub async fn load_image(path: &Path, max_bytes: u64) -> Result<ImageReference, MediaError> {
    let io_err = |source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    if size == 0 {
        return Err(MediaError::Empty(path.to_path_buf()));
    }
    if size > max_bytes {
        return Err(MediaError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(io_err)?;
    let image = ImageReference::from_bytes(&bytes);
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        format = %image.format(),
        "Loaded tag image"
    );
    Ok(image)
}
