// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation stage — draws per-row result markers onto the student's photo.

use image::{DynamicImage, Rgba};
use imageproc::drawing::draw_filled_circle_mut;
use markwerk_core::error::{MarkwerkError, Result};
use markwerk_core::types::{AnswerSequence, GridConfig, Verdict};
use tracing::{debug, info, instrument};

use crate::omr::grid::AnswerGrid;
use crate::omr::score::score;

/// Marker colour for a correctly answered row.
const CORRECT_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Marker colour pointing at the key's answer on a missed row.
const KEY_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Divisor applied to the smaller cell dimension to get the marker radius.
const RADIUS_DIVISOR: f32 = 2.5;

/// Render the outcome of a check onto the student's original colour photo.
///
/// The grid is re-derived from the photo's own dimensions — never from the
/// binarized mask, whose size may differ. Per row:
///
/// - `Correct`: a filled green circle centred in the student's chosen cell.
/// - `Incorrect` or `Unanswered` with a valid key answer: a filled red
///   circle centred in the **key's** cell, showing where the right answer
///   was.
/// - Key blank for the row: no marker.
///
/// Returns a fresh image with the same dimensions as the input; the input
/// is never modified.
#[instrument(skip_all, fields(
    width = student_image.width(),
    height = student_image.height(),
))]
pub fn annotate(
    student_image: &DynamicImage,
    config: &GridConfig,
    key: &AnswerSequence,
    student: &AnswerSequence,
) -> Result<DynamicImage> {
    config.validate()?;
    if key.len() != config.rows as usize || student.len() != config.rows as usize {
        return Err(MarkwerkError::InvalidGrid(format!(
            "answer sequences ({} key rows, {} student rows) do not match the {}-row grid",
            key.len(),
            student.len(),
            config.rows
        )));
    }

    let grid = AnswerGrid::new(
        student_image.width(),
        student_image.height(),
        config.rows,
        config.cols,
    )?;
    let verdicts = score(key, student)?;
    let radius = marker_radius(&grid);

    let mut canvas = student_image.to_rgba8();
    let mut markers = 0u32;
    for (row, verdict) in verdicts.per_row.iter().enumerate() {
        let row = row as u32;
        match verdict {
            Verdict::Correct => {
                if let Some(col) = student[row as usize].choice_index() {
                    let center = grid.cell_center(row, col as u32);
                    draw_filled_circle_mut(&mut canvas, center, radius, CORRECT_COLOR);
                    markers += 1;
                }
            }
            Verdict::Incorrect | Verdict::Unanswered => {
                if let Some(col) = key[row as usize].choice_index() {
                    let center = grid.cell_center(row, col as u32);
                    draw_filled_circle_mut(&mut canvas, center, radius, KEY_COLOR);
                    markers += 1;
                }
            }
        }
    }

    debug!(markers, radius, "Markers drawn");
    info!("Annotation complete");
    Ok(DynamicImage::ImageRgba8(canvas))
}

/// Marker radius for a grid: the smaller cell dimension divided by
/// [`RADIUS_DIVISOR`].
fn marker_radius(grid: &AnswerGrid) -> i32 {
    (grid.cell_width().min(grid.cell_height()) as f32 / RADIUS_DIVISOR) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use markwerk_core::types::Answer;

    fn white_sheet(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    fn seq(letters: &str, config: &GridConfig) -> AnswerSequence {
        AnswerSequence::from_letters(letters, config)
    }

    #[test]
    fn output_dimensions_match_input_for_any_grid() {
        for (w, h, rows, cols) in [(400u32, 1000u32, 10u32, 4u32), (333, 777, 7, 5), (40, 40, 2, 2)] {
            let config = GridConfig {
                rows,
                cols,
                choice_labels: (0..cols).map(|i| i.to_string()).collect(),
                ..GridConfig::default()
            };
            let key = AnswerSequence::new(vec![Answer::Choice(0); rows as usize]);
            let student = AnswerSequence::new(vec![Answer::Choice(0); rows as usize]);

            let annotated = annotate(&white_sheet(w, h), &config, &key, &student).unwrap();
            assert_eq!((annotated.width(), annotated.height()), (w, h));
        }
    }

    #[test]
    fn correct_row_gets_green_marker_in_student_cell() {
        let config = GridConfig {
            rows: 1,
            ..GridConfig::default()
        };
        let key = seq("B", &config);
        let student = seq("B", &config);

        let annotated = annotate(&white_sheet(80, 20), &config, &key, &student).unwrap();
        // Cell B of a 1x4 grid on an 80px-wide frame is centred at (30, 10).
        let pixel = annotated.to_rgba8().get_pixel(30, 10).0;
        assert_eq!(pixel, [0, 255, 0, 255]);
    }

    #[test]
    fn missed_row_gets_red_marker_in_key_cell() {
        let config = GridConfig {
            rows: 1,
            ..GridConfig::default()
        };
        let key = seq("D", &config);
        let student = seq("A", &config);

        let annotated = annotate(&white_sheet(80, 20), &config, &key, &student).unwrap();
        let rgba = annotated.to_rgba8();
        // The key's cell D is centred at (70, 10) — red marker there.
        assert_eq!(rgba.get_pixel(70, 10).0, [255, 0, 0, 255]);
        // The student's own (wrong) cell stays unmarked.
        assert_eq!(rgba.get_pixel(10, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn unanswered_row_points_at_key_cell() {
        let config = GridConfig {
            rows: 1,
            ..GridConfig::default()
        };
        let key = seq("C", &config);
        let student = seq("?", &config);

        let annotated = annotate(&white_sheet(80, 20), &config, &key, &student).unwrap();
        assert_eq!(annotated.to_rgba8().get_pixel(50, 10).0, [255, 0, 0, 255]);
    }

    #[test]
    fn blank_key_row_draws_no_marker() {
        let config = GridConfig {
            rows: 1,
            ..GridConfig::default()
        };
        let key = seq("?", &config);
        let student = seq("A", &config);

        let annotated = annotate(&white_sheet(80, 20), &config, &key, &student).unwrap();
        let rgba = annotated.to_rgba8();
        for col in 0..4u32 {
            let (cx, cy) = (col * 20 + 10, 10);
            assert_eq!(
                rgba.get_pixel(cx, cy).0,
                [255, 255, 255, 255],
                "cell {col} should be untouched"
            );
        }
    }

    #[test]
    fn sequence_length_mismatch_is_rejected() {
        let config = GridConfig::default();
        let key = seq("ABCD", &config);
        let student = seq("ABCD", &config);
        // Four answers against a ten-row grid.
        assert!(annotate(&white_sheet(100, 100), &config, &key, &student).is_err());
    }
}
