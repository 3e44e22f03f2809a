use thiserror::Error;

/// Top-level error type for the TagScan runtime.
///
/// Nothing inside the extraction pipeline produces these: layer failures are
/// absorbed into sentinel values. They surface only from the enclosing
/// service (unusable input, configuration, cancellation).
#[derive(Debug, Error)]
pub enum TagScanError {
    #[error("image rejected: {0}")]
    ImageRejected(String),

    #[error("unknown vision provider: {0}")]
    UnknownProvider(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("analysis cancelled")]
    Cancelled,
}
