//! Freehand annotation layer.
//!
//! The overlay is a single-channel ink mask, kept apart from the structured
//! markers. Strokes are straight segments between sampled points, all in one
//! fixed colour and width. Points arrive in the same percentage space as
//! markers and are mapped onto the raster, so a renderer can stretch the mask
//! over any surface size.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Pixel};

use super::PlanPoint;
use crate::error::{Error, Result};

/// Stroke colour renderers should use for inked pixels (`#e11d48`).
pub const STROKE_COLOR: [u8; 3] = [0xe1, 0x1d, 0x48];

/// Stroke width in overlay pixels.
pub const STROKE_WIDTH: f32 = 4.0;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const INK: Luma<u8> = Luma([255]);

/// Raster buffer holding freehand strokes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Overlay {
    ink: GrayImage,
}

impl Overlay {
    /// Create a blank overlay of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ink: GrayImage::new(width.max(1), height.max(1)),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.ink.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.ink.height()
    }

    /// Draw a straight segment between two plan points.
    pub fn draw_segment(&mut self, from: PlanPoint, to: PlanPoint) {
        let from = self.to_pixels(from);
        let to = self.to_pixels(to);
        stamp_segment(&mut self.ink, from, to, STROKE_WIDTH, INK);
    }

    /// Whether the pixel at `(x, y)` carries ink. Out-of-bounds is `false`.
    #[must_use]
    pub fn is_inked(&self, x: u32, y: u32) -> bool {
        self.ink
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] > 0)
    }

    /// Number of inked pixels.
    #[must_use]
    pub fn ink_pixels(&self) -> usize {
        self.ink.pixels().filter(|p| p.0[0] > 0).count()
    }

    /// Whether nothing has been drawn.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.ink.pixels().all(|p| p.0[0] == 0)
    }

    /// The raw ink mask.
    #[must_use]
    pub fn mask(&self) -> &GrayImage {
        &self.ink
    }

    /// Encode the mask as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_data_url(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.ink.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(&buf)))
    }

    /// Decode a mask previously produced by [`Overlay::to_data_url`].
    ///
    /// # Errors
    ///
    /// Returns an error if the data URL or the PNG inside it is malformed.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let encoded = data_url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| Error::data_url("overlay is not a PNG data URL"))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::data_url(format!("invalid base64: {e}")))?;
        let ink = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?.to_luma8();
        Ok(Self { ink })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_pixels(&self, point: PlanPoint) -> (f32, f32) {
        let w = f64::from(self.width() - 1);
        let h = f64::from(self.height() - 1);
        ((point.x() / 100.0 * w) as f32, (point.y() / 100.0 * h) as f32)
    }
}

impl TryFrom<String> for Overlay {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_data_url(&value)
    }
}

impl From<Overlay> for String {
    fn from(overlay: Overlay) -> Self {
        // PNG encoding of an in-memory buffer does not fail.
        overlay.to_data_url().unwrap_or_default()
    }
}

/// Draw a round-capped segment of the given width into any image buffer.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn stamp_segment<P>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    from: (f32, f32),
    to: (f32, f32),
    width: f32,
    pixel: P,
) where
    P: Pixel,
{
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = (dx.hypot(dy) * 2.0).ceil().max(1.0) as u32;
    let radius = width / 2.0;

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(img, from.0 + dx * t, from.1 + dy * t, radius, pixel);
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn stamp_disc<P>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    cx: f32,
    cy: f32,
    radius: f32,
    pixel: P,
) where
    P: Pixel,
{
    let (w, h) = img.dimensions();
    let r = radius.ceil() as i64;
    let (px, py) = (cx.round() as i64, cy.round() as i64);

    for oy in -r..=r {
        for ox in -r..=r {
            if ((ox * ox + oy * oy) as f32) > radius * radius {
                continue;
            }
            let (x, y) = (px + ox, py + oy);
            if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
                continue;
            }
            img.put_pixel(x as u32, y as u32, pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_overlay_is_blank() {
        let overlay = Overlay::new(80, 60);
        assert!(overlay.is_blank());
        assert_eq!(overlay.ink_pixels(), 0);
        assert_eq!((overlay.width(), overlay.height()), (80, 60));
    }

    #[test]
    fn test_zero_size_is_bumped_to_one_pixel() {
        let overlay = Overlay::new(0, 0);
        assert_eq!((overlay.width(), overlay.height()), (1, 1));
    }

    #[test]
    fn test_segment_inks_endpoints_and_midpoint() {
        let mut overlay = Overlay::new(101, 101);
        overlay.draw_segment(PlanPoint::new(10.0, 50.0), PlanPoint::new(90.0, 50.0));

        assert!(overlay.is_inked(10, 50));
        assert!(overlay.is_inked(50, 50));
        assert!(overlay.is_inked(90, 50));
        assert!(!overlay.is_inked(50, 10));
        assert!(!overlay.is_blank());
    }

    #[test]
    fn test_segment_at_edge_is_clipped() {
        let mut overlay = Overlay::new(50, 50);
        overlay.draw_segment(PlanPoint::new(0.0, 0.0), PlanPoint::new(100.0, 0.0));

        assert!(overlay.is_inked(0, 0));
        assert!(overlay.is_inked(49, 0));
        assert!(!overlay.is_inked(60, 0));
    }

    #[test]
    fn test_data_url_round_trip_keeps_ink() {
        let mut overlay = Overlay::new(40, 30);
        overlay.draw_segment(PlanPoint::new(0.0, 0.0), PlanPoint::new(100.0, 100.0));

        let url = overlay.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let restored = Overlay::from_data_url(&url).unwrap();
        assert_eq!(restored, overlay);
    }

    #[test]
    fn test_from_data_url_rejects_other_formats() {
        assert!(Overlay::from_data_url("data:image/jpeg;base64,AAAA").is_err());
        assert!(Overlay::from_data_url("data:image/png;base64,!!!").is_err());
        assert!(Overlay::from_data_url("data:image/png;base64,AAAA").is_err());
    }
}
