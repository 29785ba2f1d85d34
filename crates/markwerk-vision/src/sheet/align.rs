// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet alignment — optional perspective correction for photos where the
// answer sheet sits crooked in the frame.
//
// The grid extractor assumes an axis-aligned, frame-filling sheet. This
// collaborator runs *before* the pipeline and warps the detected sheet
// quadrilateral onto the full frame so that assumption holds. It is never
// part of the extractor itself.

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::{debug, info, instrument, warn};

/// Blur strength before edge detection.
const EDGE_BLUR_SIGMA: f32 = 2.0;

/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// The detected sheet quad must cover at least this share of the frame.
const MIN_QUAD_AREA_FRACTION: f32 = 0.10;

/// Straighten a crooked sheet photo.
///
/// Detects the sheet's four borders with Canny edges and a Hough line
/// transform, then warps the enclosed quadrilateral onto the full original
/// frame. When no clean quadrilateral is found — blurry borders, a sheet
/// already filling the frame, a uniform image — the input is returned
/// unchanged; alignment is best-effort and never fails the check.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn deskew(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return image.clone();
    }

    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, EDGE_BLUR_SIGMA);
    let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);
    debug!("Edges computed");

    let corners = match detect_sheet_quad(&edges, width, height) {
        Some(corners) => corners,
        None => {
            info!("No sheet quadrilateral found; returning photo unchanged");
            return image.clone();
        }
    };

    let quad_area = polygon_area(&corners);
    let frame_area = width as f32 * height as f32;
    if quad_area < frame_area * MIN_QUAD_AREA_FRACTION {
        warn!(
            quad_area,
            min_area = frame_area * MIN_QUAD_AREA_FRACTION,
            "Detected quadrilateral too small; returning photo unchanged"
        );
        return image.clone();
    }

    // Map the sheet corners onto the full frame, so the extractor's
    // frame-filling assumption holds downstream.
    let target: [(f32, f32); 4] = [
        (0.0, 0.0),
        (width as f32, 0.0),
        (width as f32, height as f32),
        (0.0, height as f32),
    ];
    let projection = match Projection::from_control_points(corners, target) {
        Some(p) => p,
        None => {
            warn!("Degenerate sheet corners; returning photo unchanged");
            return image.clone();
        }
    };

    let source = image.to_rgba8();
    let mut output = RgbaImage::new(width, height);
    warp_into(
        &source,
        &projection,
        Interpolation::Bilinear,
        Rgba([255u8, 255, 255, 255]),
        &mut output,
    );

    info!("Sheet warped onto the full frame");
    DynamicImage::ImageRgba8(output)
}

/// Find the sheet's corner points from an edge image.
///
/// Runs a Hough line transform, splits the lines into roughly-horizontal
/// and roughly-vertical buckets, takes the outermost line on each side, and
/// intersects them. Returns `[top_left, top_right, bottom_right,
/// bottom_left]`, or `None` when the photo does not yield two usable lines
/// per orientation.
fn detect_sheet_quad(
    edges: &GrayImage,
    width: u32,
    height: u32,
) -> Option<[(f32, f32); 4]> {
    // Vote threshold proportional to the diagonal, so detection scales with
    // resolution. The suppression radius weeds out near-duplicate lines.
    let diagonal = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt();
    let options = LineDetectionOptions {
        vote_threshold: (diagonal * 0.25).max(80.0) as u32,
        suppression_radius: 8,
    };
    let lines = detect_lines(edges, options);
    debug!(line_count = lines.len(), "Hough lines detected");

    let (horizontal, vertical) = split_by_orientation(&lines);
    if horizontal.len() < 2 || vertical.len() < 2 {
        debug!(
            horizontal = horizontal.len(),
            vertical = vertical.len(),
            "Not enough border lines"
        );
        return None;
    }

    let top = extreme_by_distance(&horizontal, false);
    let bottom = extreme_by_distance(&horizontal, true);
    let left = extreme_by_distance(&vertical, false);
    let right = extreme_by_distance(&vertical, true);

    Some([
        intersect(&top, &left)?,
        intersect(&top, &right)?,
        intersect(&bottom, &right)?,
        intersect(&bottom, &left)?,
    ])
}

/// Split Hough lines into roughly-horizontal and roughly-vertical buckets.
///
/// `angle_in_degrees` is 0..180: within 30 degrees of 0/180 counts as
/// horizontal, within 30 degrees of 90 as vertical. Diagonals are dropped —
/// sheet borders are never diagonal in a usable photo.
fn split_by_orientation(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for line in lines {
        let angle = line.angle_in_degrees;
        if angle <= 30 || angle >= 150 {
            horizontal.push(*line);
        } else if (60..=120).contains(&angle) {
            vertical.push(*line);
        }
    }
    (horizontal, vertical)
}

/// The line closest to (or, with `farthest`, furthest from) the origin,
/// measured by the polar distance `r`. For horizontals that is the top or
/// bottom border; for verticals the left or right one.
fn extreme_by_distance(lines: &[PolarLine], farthest: bool) -> PolarLine {
    let ordering = |a: &&PolarLine, b: &&PolarLine| {
        a.r.partial_cmp(&b.r).unwrap_or(std::cmp::Ordering::Equal)
    };
    let line = if farthest {
        lines.iter().max_by(ordering)
    } else {
        lines.iter().min_by(ordering)
    };
    // Callers only reach this with non-empty buckets.
    *line.unwrap_or(&lines[0])
}

/// Intersection of two lines in polar (Hough) form.
///
/// A `PolarLine` `(r, theta)` represents `x cos(theta) + y sin(theta) = r`.
/// Returns `None` for (nearly) parallel lines.
fn intersect(a: &PolarLine, b: &PolarLine) -> Option<(f32, f32)> {
    let theta_a = (a.angle_in_degrees as f64).to_radians();
    let theta_b = (b.angle_in_degrees as f64).to_radians();

    let (sin_a, cos_a) = theta_a.sin_cos();
    let (sin_b, cos_b) = theta_b.sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (r_a, r_b) = (a.r as f64, b.r as f64);
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;
    Some((x as f32, y as f32))
}

/// Shoelace area of a quadrilateral with vertices in order (CW or CCW).
fn polygon_area(corners: &[(f32, f32); 4]) -> f32 {
    let mut area = 0.0f32;
    for i in 0..corners.len() {
        let j = (i + 1) % corners.len();
        area += corners[i].0 * corners[j].1;
        area -= corners[j].0 * corners[i].1;
    }
    area.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// A uniform photo has no edges; deskew must hand it back unchanged.
    #[test]
    fn uniform_photo_returns_unchanged() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 300, Luma([200u8])));
        let out = deskew(&img);
        assert_eq!((out.width(), out.height()), (200, 300));
    }

    /// A photo with a clear bright sheet on a dark desk must not panic and
    /// must keep the frame size, warped or not.
    #[test]
    fn synthetic_sheet_keeps_frame_size() {
        let (w, h) = (400u32, 500u32);
        let mut img = GrayImage::from_pixel(w, h, Luma([30u8]));
        for y in 60..440 {
            for x in 50..350 {
                img.put_pixel(x, y, Luma([240u8]));
            }
        }

        let out = deskew(&DynamicImage::ImageLuma8(img));
        assert_eq!((out.width(), out.height()), (w, h));
    }

    #[test]
    fn zero_sized_photo_is_passed_through() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let out = deskew(&img);
        assert_eq!(out.width(), 0);
    }

    #[test]
    fn perpendicular_lines_intersect_where_expected() {
        // Horizontal line at y=100: angle=90, r=100. Vertical at x=50.
        let h = PolarLine {
            r: 100.0,
            angle_in_degrees: 90,
        };
        let v = PolarLine {
            r: 50.0,
            angle_in_degrees: 0,
        };

        let (x, y) = intersect(&h, &v).expect("should intersect");
        assert!((x - 50.0).abs() < 0.5 && (y - 100.0).abs() < 0.5);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let a = PolarLine {
            r: 50.0,
            angle_in_degrees: 0,
        };
        let b = PolarLine {
            r: 100.0,
            angle_in_degrees: 0,
        };
        assert!(intersect(&a, &b).is_none());
    }

    #[test]
    fn orientation_split_drops_diagonals() {
        let lines = vec![
            PolarLine { r: 10.0, angle_in_degrees: 0 },
            PolarLine { r: 20.0, angle_in_degrees: 5 },
            PolarLine { r: 30.0, angle_in_degrees: 90 },
            PolarLine { r: 40.0, angle_in_degrees: 85 },
            PolarLine { r: 50.0, angle_in_degrees: 45 },
            PolarLine { r: 60.0, angle_in_degrees: 170 },
        ];
        let (horizontal, vertical) = split_by_orientation(&lines);
        assert_eq!(horizontal.len(), 3);
        assert_eq!(vertical.len(), 2);
    }

    #[test]
    fn polygon_area_of_rectangle() {
        let corners = [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)];
        assert!((polygon_area(&corners) - 50.0).abs() < 1e-3);
    }
}
