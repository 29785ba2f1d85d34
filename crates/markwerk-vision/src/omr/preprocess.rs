// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessing stage — grayscale conversion, Gaussian smoothing, and
// adaptive binarization of a photographed answer sheet.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;
use markwerk_core::error::{MarkwerkError, Result};
use tracing::{debug, info, instrument};

/// Gaussian smoothing strength. Equivalent to a 5x5 kernel with the sigma
/// derived from the kernel size: 0.3 * ((5 - 1) * 0.5 - 1) + 0.8.
const BLUR_SIGMA: f32 = 1.1;

/// Half-width of the adaptive threshold neighbourhood (11x11 window).
const THRESHOLD_BLOCK_RADIUS: u32 = 5;

/// Bias subtracted from the local mean before comparison.
const THRESHOLD_BIAS: f64 = 2.0;

/// A binarized sheet image: every pixel is either ink (foreground) or paper.
///
/// Foreground pixels hold [`BinaryMask::FOREGROUND`], everything else is 0.
/// The mask always has the same dimensions as the image it was derived from.
#[derive(Debug, Clone)]
pub struct BinaryMask {
    pixels: GrayImage,
}

impl BinaryMask {
    /// Pixel value marking ink.
    pub const FOREGROUND: u8 = 255;

    /// Wrap an existing grayscale image, normalising every nonzero pixel to
    /// [`Self::FOREGROUND`].
    pub fn from_gray(gray: GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let pixels = GrayImage::from_fn(width, height, |x, y| {
            if gray.get_pixel(x, y).0[0] > 0 {
                Luma([Self::FOREGROUND])
            } else {
                Luma([0])
            }
        });
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether the pixel at (x, y) is ink.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y).0[0] == Self::FOREGROUND
    }

    /// Count of ink pixels inside a sub-rectangle of the mask.
    ///
    /// The rectangle must lie within the mask bounds.
    pub fn ink_count_in(&self, rect: &Rect) -> u64 {
        let mut count = 0u64;
        let x0 = rect.left() as u32;
        let y0 = rect.top() as u32;
        for y in y0..y0 + rect.height() {
            for x in x0..x0 + rect.width() {
                if self.is_set(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Borrow the underlying grayscale pixels.
    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }
}

/// Binarize a sheet photo into an ink mask.
///
/// Steps, in order:
/// 1. Grayscale conversion (standard luminance weighting).
/// 2. Gaussian blur ([`BLUR_SIGMA`]) to suppress scan noise.
/// 3. Mean-adaptive threshold with inverted polarity: a pixel becomes
///    foreground where it is darker than its 11x11 neighbourhood mean by
///    more than [`THRESHOLD_BIAS`]. Dark pencil marks on light paper come
///    out as ink; uniform regions come out clear.
///
/// The local means are computed with an integral image, so the whole pass
/// is linear in the pixel count.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn preprocess(image: &DynamicImage) -> Result<BinaryMask> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(MarkwerkError::ImageDecode(format!(
            "cannot binarize a zero-sized image ({width}x{height})"
        )));
    }

    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    debug!(sigma = BLUR_SIGMA, "Grayscale and blur applied");

    let integral = compute_integral_image(&blurred);

    let mut mask = GrayImage::new(width, height);
    let mut ink_pixels = 0u64;
    for y in 0..height {
        for x in 0..width {
            let local_mean =
                region_mean(&integral, width, height, x, y, THRESHOLD_BLOCK_RADIUS);
            let value = blurred.get_pixel(x, y).0[0] as f64;
            if value < local_mean - THRESHOLD_BIAS {
                mask.put_pixel(x, y, Luma([BinaryMask::FOREGROUND]));
                ink_pixels += 1;
            }
        }
    }

    info!(ink_pixels, "Adaptive binarization complete");
    Ok(BinaryMask { pixels: mask })
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `table[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within a square region centred on (cx, cy) with the
/// given radius, clamped to image bounds, using the precomputed integral
/// image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // Summed-area table lookup: S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
