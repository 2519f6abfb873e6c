//! Error types for image normalization

use formkit_common::{ErrorSeverity, Severity};
use thiserror::Error;

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while normalizing an image
#[derive(Debug, Error)]
pub enum ImageError {
    /// Input bytes are not a decodable raster image
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding failed
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Byte or pixel limits are unusable
    #[error("invalid image limits: {0}")]
    InvalidLimits(String),
}

impl Severity for ImageError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ImageError::Decode(_) | ImageError::Encode(_) => ErrorSeverity::Error,
            ImageError::InvalidLimits(_) => ErrorSeverity::Critical,
        }
    }
}
