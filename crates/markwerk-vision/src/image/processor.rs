// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet photo handling — load, crop to the sheet boundary, rotate,
// grayscale, contrast boosting for faint pencil marks, and export. Operates
// on in-memory images using the `image` and `imageproc` crates.

use image::{DynamicImage, ImageFormat, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use markwerk_core::error::{MarkwerkError, Result};
use tracing::{debug, info, instrument};

/// A photographed answer sheet held in memory.
///
/// All operations are non-destructive: each method consumes `self` and
/// returns a new `SheetImage` wrapping the transformed photo, enabling
/// method chaining.
///
/// ```ignore
/// let sheet = SheetImage::open("photo.jpg")?
///     .rotate(90.0)
///     .crop(120, 40, 900, 1400)
///     .boost_contrast(1.4);
/// ```
pub struct SheetImage {
    /// The current working image.
    image: DynamicImage,
}

impl SheetImage {
    // -- Construction ---------------------------------------------------------

    /// Load a sheet photo from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            MarkwerkError::ImageDecode(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Sheet photo loaded"
        );
        Ok(Self { image })
    }

    /// Decode a sheet photo from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            MarkwerkError::ImageDecode(format!("failed to decode sheet photo: {}", err))
        })?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Sheet photo decoded from bytes"
        );
        Ok(Self { image })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current photo width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current photo height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the wrapper and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region — typically the bubble grid — from the
    /// photo.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// crop rectangle. Values are clamped to the photo bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x);
        let safe_h = height.min(img_h - safe_y);

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping sheet photo");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    /// Rotate the photo by an arbitrary angle in degrees (clockwise).
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For
    /// other angles, an affine transform with bilinear interpolation is
    /// applied around the photo centre.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        info!(degrees, "Rotating sheet photo");

        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let radians = degrees.to_radians();
        let default_pixel = image::Rgba([255u8, 255, 255, 0]);

        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &rgba,
            radians,
            Interpolation::Bilinear,
            default_pixel,
        );

        debug!("General rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Convert the photo to grayscale (luma).
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        info!("Converting to grayscale");
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Boost contrast by a factor, pivoting around mid-grey. Values > 1.0
    /// darken faint pencil marks relative to the paper; 1.0 is a no-op.
    #[instrument(skip(self), fields(factor))]
    pub fn boost_contrast(self, factor: f32) -> Self {
        info!(factor, "Boosting contrast");

        let rgba = self.image.to_rgba8();

        let contrasted = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let pixel = rgba.get_pixel(x, y);
            let image::Rgba([r, g, b, a]) = *pixel;
            let adjust = |channel: u8| -> u8 {
                let val = factor * (channel as f32 - 128.0) + 128.0;
                val.clamp(0.0, 255.0) as u8
            };
            image::Rgba([adjust(r), adjust(g), adjust(b), a])
        });

        Self {
            image: DynamicImage::ImageRgba8(contrasted),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current photo as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| {
                MarkwerkError::ImageEncode(format!("PNG encoding failed: {}", err))
            })?;
        Ok(buffer)
    }

    /// Encode the current photo as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(|err| {
            MarkwerkError::ImageEncode(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }

    /// Write the photo to a file. The format is inferred from the file
    /// extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            MarkwerkError::ImageEncode(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn sample(width: u32, height: u32) -> SheetImage {
        SheetImage::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([200, 200, 200]),
        )))
    }

    #[test]
    fn crop_is_clamped_to_bounds() {
        let cropped = sample(100, 80).crop(90, 70, 50, 50);
        assert_eq!((cropped.width(), cropped.height()), (10, 10));
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let rotated = sample(100, 60).rotate(90.0);
        assert_eq!((rotated.width(), rotated.height()), (60, 100));
    }

    #[test]
    fn full_turn_is_a_no_op() {
        let rotated = sample(100, 60).rotate(360.0);
        assert_eq!((rotated.width(), rotated.height()), (100, 60));
    }

    #[test]
    fn png_bytes_decode_back_to_same_size() {
        let bytes = sample(30, 20).to_png_bytes().unwrap();
        let reloaded = SheetImage::from_bytes(&bytes).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (30, 20));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let result = SheetImage::from_bytes(&[0u8, 1, 2, 3, 4]);
        assert!(matches!(result, Err(MarkwerkError::ImageDecode(_))));
    }

    #[test]
    fn boost_contrast_darkens_marks_and_lightens_paper() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([200, 200, 200]));
        img.put_pixel(0, 0, Rgb([80, 80, 80]));
        let boosted = SheetImage::from_dynamic(DynamicImage::ImageRgb8(img))
            .boost_contrast(1.5)
            .into_dynamic()
            .to_rgb8();

        assert!(boosted.get_pixel(0, 0).0[0] < 80, "mark should get darker");
        assert!(boosted.get_pixel(2, 2).0[0] > 200, "paper should get lighter");
    }

    #[test]
    fn save_roundtrip_via_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");

        let gray = GrayImage::from_pixel(12, 9, Luma([128u8]));
        SheetImage::from_dynamic(DynamicImage::ImageLuma8(gray))
            .save(&path)
            .unwrap();

        let reloaded = SheetImage::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (12, 9));
    }

    #[test]
    fn open_missing_file_is_a_decode_error() {
        let result = SheetImage::open("/nonexistent/sheet.jpg");
        assert!(matches!(result, Err(MarkwerkError::ImageDecode(_))));
    }
}
