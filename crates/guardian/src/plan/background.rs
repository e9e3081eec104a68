//! Background floor-plan images.
//!
//! Uploaded images are never stored as-is. They are decoded, shrunk so that
//! the longer edge fits [`DownscaleLimits::max_edge`], and re-encoded as a
//! JPEG data URL.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use tracing::debug;

use super::overlay::stamp_segment;
use crate::config::PlanConfig;
use crate::error::{Error, Result};

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";
const IMAGE_DATA_URL_PREFIX: &str = "data:image/";

/// A background image, held as an image data URL.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackgroundImage(String);

impl BackgroundImage {
    /// Wrap an existing image data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `data_url` is not an image data URL.
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self> {
        let data_url = data_url.into();
        if !data_url.starts_with(IMAGE_DATA_URL_PREFIX) || !data_url.contains(";base64,") {
            return Err(Error::data_url("background is not a base64 image data URL"));
        }
        Ok(Self(data_url))
    }

    fn from_jpeg(bytes: &[u8]) -> Self {
        Self(format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes)))
    }

    /// The data URL.
    #[must_use]
    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// Size of the data URL in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }

    /// Decode the image.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid base64 or not an image.
    pub fn decode(&self) -> Result<DynamicImage> {
        let (_, payload) = self
            .0
            .split_once(";base64,")
            .ok_or_else(|| Error::data_url("missing base64 payload"))?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| Error::data_url(format!("invalid base64: {e}")))?;
        Ok(image::load_from_memory(&bytes)?)
    }

    /// Pixel dimensions of the stored image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        Ok(self.decode()?.dimensions())
    }
}

impl fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BackgroundImage")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

impl TryFrom<String> for BackgroundImage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_data_url(value)
    }
}

impl From<BackgroundImage> for String {
    fn from(image: BackgroundImage) -> Self {
        image.0
    }
}

/// Size and quality bounds for stored backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownscaleLimits {
    /// Longest edge in pixels.
    pub max_edge: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl From<&PlanConfig> for DownscaleLimits {
    fn from(config: &PlanConfig) -> Self {
        Self {
            max_edge: config.max_background_edge,
            quality: config.background_quality,
        }
    }
}

impl Default for DownscaleLimits {
    fn default() -> Self {
        Self::from(&PlanConfig::default())
    }
}

/// Decode `bytes`, shrink to fit `limits`, and re-encode as JPEG.
///
/// Images already within the limit keep their size but are still re-encoded.
///
/// # Errors
///
/// Returns an error if `bytes` is not a decodable image.
pub fn downscale(bytes: &[u8], limits: DownscaleLimits) -> Result<BackgroundImage> {
    let original = image::load_from_memory(bytes)?;
    let (width, height) = original.dimensions();
    let max_edge = limits.max_edge.max(1);

    let fitted = if width.max(height) > max_edge {
        original.thumbnail(max_edge, max_edge)
    } else {
        original
    };
    debug!(
        width,
        height,
        stored_width = fitted.width(),
        stored_height = fitted.height(),
        "Prepared background image"
    );

    encode_jpeg(&fitted.to_rgb8(), limits.quality)
}

/// [`downscale`] on tokio's blocking pool.
///
/// # Errors
///
/// Returns an error if `bytes` is not a decodable image or the blocking task
/// fails.
pub async fn downscale_async(bytes: Vec<u8>, limits: DownscaleLimits) -> Result<BackgroundImage> {
    tokio::task::spawn_blocking(move || downscale(&bytes, limits))
        .await
        .map_err(|e| Error::internal(format!("image task failed: {e}")))?
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<BackgroundImage> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(BackgroundImage::from_jpeg(&buf))
}

const EXAMPLE_WIDTH: u32 = 800;
const EXAMPLE_HEIGHT: u32 = 600;
const WALL: Rgb<u8> = Rgb([0x33, 0x41, 0x55]);
const DOOR: Rgb<u8> = Rgb([0x94, 0xa3, 0xb8]);
const WALL_WIDTH: f32 = 5.0;
const DOOR_WIDTH: f32 = 3.0;

/// Interior walls of the example plan, as pixel segments.
const INTERIOR_WALLS: [((f32, f32), (f32, f32)); 3] = [
    ((400.0, 100.0), (400.0, 500.0)),
    ((100.0, 300.0), (400.0, 300.0)),
    ((400.0, 250.0), (700.0, 250.0)),
];

/// Door swings: start, control point, end.
const DOOR_SWINGS: [[(f32, f32); 3]; 2] = [
    [(150.0, 300.0), (150.0, 340.0), (110.0, 340.0)],
    [(400.0, 400.0), (440.0, 400.0), (440.0, 440.0)],
];

/// Generate a simple three-room floor plan to use when no real plan exists.
///
/// # Errors
///
/// Returns an error if JPEG encoding fails.
pub fn example_floor_plan(quality: u8) -> Result<BackgroundImage> {
    let mut img = RgbImage::from_pixel(EXAMPLE_WIDTH, EXAMPLE_HEIGHT, Rgb([0xff, 0xff, 0xff]));

    let outline: [(f32, f32); 4] = [(100.0, 100.0), (700.0, 100.0), (700.0, 500.0), (100.0, 500.0)];
    for (i, from) in outline.iter().enumerate() {
        let to = outline[(i + 1) % outline.len()];
        stamp_segment(&mut img, *from, to, WALL_WIDTH, WALL);
    }
    for (from, to) in INTERIOR_WALLS {
        stamp_segment(&mut img, from, to, WALL_WIDTH, WALL);
    }
    for [start, control, end] in DOOR_SWINGS {
        draw_quadratic(&mut img, start, control, end);
    }

    encode_jpeg(&img, quality)
}

#[allow(clippy::cast_precision_loss)]
fn draw_quadratic(img: &mut RgbImage, p0: (f32, f32), p1: (f32, f32), p2: (f32, f32)) {
    const SAMPLES: u32 = 16;
    let at = |t: f32| {
        let u = 1.0 - t;
        (
            u * u * p0.0 + 2.0 * u * t * p1.0 + t * t * p2.0,
            u * u * p0.1 + 2.0 * u * t * p1.1 + t * t * p2.1,
        )
    };

    let mut prev = p0;
    for i in 1..=SAMPLES {
        let next = at(i as f32 / SAMPLES as f32);
        stamp_segment(img, prev, next, DOOR_WIDTH, DOOR);
        prev = next;
    }
}
