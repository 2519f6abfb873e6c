//! Bounded JPEG re-encoding.
//!
//! Steps: decode -> flatten alpha onto white -> downscale so the longest
//! edge fits -> encode at quality 0.7 -> step quality down by 0.1 until the
//! byte limit is met or the 0.1 floor is reached. The result is returned
//! even when the floor encoding is still too large; the caller decides what
//! to do with `within_limit == false`.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ImageError, Result};

/// Quality of the first encoding attempt, in tenths (0.7).
const INITIAL_QUALITY_TENTHS: u8 = 7;

/// Lowest quality attempted, in tenths (0.1).
const FLOOR_QUALITY_TENTHS: u8 = 1;

/// MIME type of every normalized image.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Byte and pixel bounds for a normalized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLimits {
    pub max_bytes: u64,
    pub max_dimension: u32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_dimension: 1920,
        }
    }
}

impl ImageLimits {
    /// Tighten the byte limit, e.g. to a file field's own `max_bytes`.
    pub fn with_max_bytes_at_most(self, max_bytes: u64) -> Self {
        Self {
            max_bytes: self.max_bytes.min(max_bytes),
            ..self
        }
    }
}

/// A re-encoded image and how it was produced.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Final quality on a 0-1 scale.
    pub quality: f32,
    /// Number of encodings performed.
    pub attempts: u8,
    /// Whether `bytes` fits the byte limit.
    pub within_limit: bool,
}

impl NormalizedImage {
    pub fn mime(&self) -> &'static str {
        OUTPUT_MIME
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Whether the normalizer can decode this MIME type.
pub fn is_normalizable(mime: &str) -> bool {
    matches!(
        mime.to_ascii_lowercase().as_str(),
        "image/jpeg" | "image/jpg" | "image/png" | "image/gif"
    )
}

/// Dimensions after fitting the longest edge into `max_dimension`.
/// Images already within bounds are not upscaled.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let largest = width.max(height);
    if largest <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / largest as f64;
    let scaled = |edge: u32| ((edge as f64 * scale).round() as u32).clamp(1, max_dimension);
    (scaled(width), scaled(height))
}

/// Normalize raw image bytes into a JPEG bounded by `limits`.
pub fn normalize(raw: &[u8], limits: ImageLimits) -> Result<NormalizedImage> {
    if limits.max_bytes == 0 || limits.max_dimension == 0 {
        return Err(ImageError::InvalidLimits(format!(
            "max_bytes={} max_dimension={}",
            limits.max_bytes, limits.max_dimension
        )));
    }

    let decoded = image::load_from_memory(raw).map_err(ImageError::Decode)?;
    let (orig_w, orig_h) = decoded.dimensions();
    let flattened = flatten_onto_white(&decoded);

    let (width, height) = fit_dimensions(orig_w, orig_h, limits.max_dimension);
    let pixels = if (width, height) == (orig_w, orig_h) {
        flattened
    } else {
        debug!(
            from = format!("{orig_w}x{orig_h}"),
            to = format!("{width}x{height}"),
            "downscaling image"
        );
        image::imageops::resize(&flattened, width, height, FilterType::Triangle)
    };

    let mut tenths = INITIAL_QUALITY_TENTHS;
    let mut attempts = 0u8;
    let bytes = loop {
        let encoded = encode_jpeg(&pixels, tenths * 10)?;
        attempts += 1;
        let fits = encoded.len() as u64 <= limits.max_bytes;
        if fits || tenths <= FLOOR_QUALITY_TENTHS {
            break encoded;
        }
        tenths -= 1;
    };

    let within_limit = bytes.len() as u64 <= limits.max_bytes;
    let quality = f32::from(tenths) / 10.0;
    if within_limit {
        debug!(
            size = bytes.len(),
            quality, attempts, "normalized image within limit"
        );
    } else {
        warn!(
            size = bytes.len(),
            max_bytes = limits.max_bytes,
            "image still exceeds byte limit at floor quality"
        );
    }

    Ok(NormalizedImage {
        bytes,
        width,
        height,
        quality,
        attempts,
        within_limit,
    })
}

fn encode_jpeg(pixels: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(pixels)
        .map_err(ImageError::Encode)?;
    Ok(out)
}

/// JPEG has no alpha channel; composite transparent pixels onto white.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| {
            let alpha = u16::from(a);
            ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8
        };
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
