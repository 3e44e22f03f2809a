//! Image intake for the inspection pipeline: format sniffing and
//! self-describing data-URI references.

pub mod image;
pub mod mime_detect;

pub use image::{load_image, ImageFormat, ImageReference, MediaError};
pub use mime_detect::{detect_mime_type, is_image, sniff_format};
