//! Image normalization for file fields
//!
//! Turns arbitrary raster uploads into JPEGs bounded by a byte size and a
//! maximum edge length. Normalization is CPU-bound and synchronous; async
//! callers should run it on a blocking thread.

pub mod error;
pub mod normalize;

pub use error::{ImageError, Result};
pub use normalize::{
    fit_dimensions, is_normalizable, normalize, ImageLimits, NormalizedImage, OUTPUT_MIME,
};
