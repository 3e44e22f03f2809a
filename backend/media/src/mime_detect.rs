//! MIME type detection for tag photographs.
//!
//! Content sniffing is authoritative; the extension lookup only labels files
//! for logs and CLI output.

use std::path::Path;

use crate::image::ImageFormat;

/// Detect an image format from the leading magic bytes.
///
/// Signatures are checked in priority order: PNG, GIF, JPEG, then WEBP
/// (a `RIFF` container with a `WEBP` marker in the first 20 bytes).
pub fn sniff_format(prefix: &[u8]) -> Option<ImageFormat> {
    if prefix.starts_with(b"\x89PNG") {
        Some(ImageFormat::Png)
    } else if prefix.starts_with(b"GIF") {
        Some(ImageFormat::Gif)
    } else if prefix.starts_with(b"\xff\xd8\xff") {
        Some(ImageFormat::Jpeg)
    } else if prefix.starts_with(b"RIFF")
        && prefix[..prefix.len().min(20)].windows(4).any(|w| w == b"WEBP")
    {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "heic"         => "image/heic",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        _              => "application/octet-stream",
    }
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn sniffs_png() {
        assert_eq!(sniff_format(b"\x89PNG\r\n\x1a\n\0\0"), Some(ImageFormat::Png));
    }

    #[test]
    fn sniffs_gif() {
        assert_eq!(sniff_format(b"GIF89a"), Some(ImageFormat::Gif));
    }

    #[test]
    fn sniffs_jpeg() {
        assert_eq!(sniff_format(b"\xff\xd8\xff\xe0\0\x10JFIF"), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn sniffs_webp() {
        assert_eq!(sniff_format(b"RIFF\x24\0\0\0WEBPVP8 "), Some(ImageFormat::Webp));
    }

    #[test]
    fn riff_without_webp_marker_is_unrecognised() {
        assert_eq!(sniff_format(b"RIFF\x24\0\0\0WAVEfmt "), None);
    }

    #[test]
    fn webp_marker_past_twenty_bytes_is_ignored() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0u8; 20]);
        bytes.extend_from_slice(b"WEBP");
        assert_eq!(sniff_format(&bytes), None);
    }

    #[test]
    fn detects_jpeg_extension() {
        assert_eq!(detect_mime_type(&PathBuf::from("tag.JPG")), "image/jpeg");
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_mime_type(&PathBuf::from("tag.xyz")), "application/octet-stream");
        assert!(!is_image("application/octet-stream"));
    }
}
