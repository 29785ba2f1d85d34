// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid extraction stage — partitions a binarized sheet into answer cells and
// votes per row on which choice was marked.
//
// The sheet is assumed axis-aligned and filling the frame; there is no skew
// correction or automatic grid detection here. Crooked photos go through
// `sheet::align::deskew` first.

use imageproc::rect::Rect;
use markwerk_core::error::{MarkwerkError, Result};
use markwerk_core::types::{Answer, AnswerSequence, GridConfig, TiePolicy};
use tracing::{debug, instrument, trace};

use crate::omr::preprocess::BinaryMask;

/// Fixed rows x cols partition of a frame into equal rectangular cells.
///
/// Cell boundaries come from integer division of the frame dimensions;
/// remainder pixels belong to the last row/column. The same partition is
/// applied to the binarized mask during extraction and, re-derived from the
/// colour photo's own dimensions, during annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerGrid {
    rows: u32,
    cols: u32,
    frame_width: u32,
    frame_height: u32,
    cell_width: u32,
    cell_height: u32,
}

impl AnswerGrid {
    /// Partition a `frame_width` x `frame_height` frame into `rows` x `cols`
    /// cells.
    ///
    /// Fails with [`MarkwerkError::InvalidGrid`] when the grid has zero
    /// rows/cols or the frame is too small to give every cell at least one
    /// pixel.
    pub fn new(frame_width: u32, frame_height: u32, rows: u32, cols: u32) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(MarkwerkError::InvalidGrid(format!(
                "grid must have at least one row and one column, got {rows}x{cols}"
            )));
        }
        let cell_width = frame_width / cols;
        let cell_height = frame_height / rows;
        if cell_width == 0 || cell_height == 0 {
            return Err(MarkwerkError::InvalidGrid(format!(
                "frame {frame_width}x{frame_height} is too small for a {rows}x{cols} grid"
            )));
        }
        Ok(Self {
            rows,
            cols,
            frame_width,
            frame_height,
            cell_width,
            cell_height,
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    /// The rectangle covered by the cell at (row, col). The last row and
    /// column absorb any remainder pixels from the integer division.
    pub fn cell(&self, row: u32, col: u32) -> Rect {
        debug_assert!(row < self.rows && col < self.cols);

        let x = col * self.cell_width;
        let y = row * self.cell_height;
        let width = if col == self.cols - 1 {
            self.frame_width - x
        } else {
            self.cell_width
        };
        let height = if row == self.rows - 1 {
            self.frame_height - y
        } else {
            self.cell_height
        };
        Rect::at(x as i32, y as i32).of_size(width, height)
    }

    /// Centre of the nominal (un-expanded) cell at (row, col), for marker
    /// placement.
    pub fn cell_center(&self, row: u32, col: u32) -> (i32, i32) {
        let cx = (col * self.cell_width + self.cell_width / 2) as i32;
        let cy = (row * self.cell_height + self.cell_height / 2) as i32;
        (cx, cy)
    }
}

/// Read one answer per row off a binarized sheet.
///
/// Each row's cells are ranked by ink count. The column with the strictly
/// greatest count wins; with [`TiePolicy::FirstMaxWins`] (the default) the
/// leftmost of several equally-inked columns wins instead, while
/// [`TiePolicy::NoAnswer`] voids such rows. A row whose maximum is zero —
/// nothing marked at all — is always [`Answer::NoAnswer`].
///
/// The returned sequence always has exactly `config.rows` entries.
#[instrument(skip_all, fields(
    width = mask.width(),
    height = mask.height(),
    rows = config.rows,
    cols = config.cols,
))]
pub fn extract_answers(mask: &BinaryMask, config: &GridConfig) -> Result<AnswerSequence> {
    config.validate()?;
    let grid = AnswerGrid::new(mask.width(), mask.height(), config.rows, config.cols)?;

    let mut answers = Vec::with_capacity(config.rows as usize);
    for row in 0..grid.rows() {
        let counts: Vec<u64> = (0..grid.cols())
            .map(|col| mask.ink_count_in(&grid.cell(row, col)))
            .collect();
        trace!(row, ?counts, "Row ink counts");
        answers.push(select_answer(&counts, config.tie_policy));
    }

    debug!(
        answered = answers.iter().filter(|a| a.is_choice()).count(),
        "Extraction complete"
    );
    Ok(AnswerSequence::new(answers))
}

/// Pick the winning column for one row of ink counts.
fn select_answer(counts: &[u64], tie_policy: TiePolicy) -> Answer {
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        // An unmarked row has no winner, whatever the policy.
        return Answer::NoAnswer;
    }

    let mut winners = counts.iter().enumerate().filter(|&(_, &c)| c == max);
    let first = winners.next().map(|(col, _)| col);
    let contested = winners.next().is_some();

    match (first, contested, tie_policy) {
        (Some(col), false, _) => Answer::Choice(col),
        (Some(col), true, TiePolicy::FirstMaxWins) => Answer::Choice(col),
        (Some(_), true, TiePolicy::NoAnswer) => Answer::NoAnswer,
        (None, _, _) => Answer::NoAnswer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Build a rows x cols mask with the given cells fully inked.
    fn mask_with_marks(
        rows: u32,
        cols: u32,
        cell: u32,
        marks: &[(u32, u32)],
    ) -> BinaryMask {
        let mut gray = GrayImage::new(cols * cell, rows * cell);
        for &(row, col) in marks {
            for y in row * cell..(row + 1) * cell {
                for x in col * cell..(col + 1) * cell {
                    gray.put_pixel(x, y, Luma([255u8]));
                }
            }
        }
        BinaryMask::from_gray(gray)
    }

    #[test]
    fn extraction_length_always_equals_rows() {
        let config = GridConfig::default();
        let mask = mask_with_marks(10, 4, 8, &[]);
        let answers = extract_answers(&mask, &config).unwrap();
        assert_eq!(answers.len(), 10);
    }

    /// Row 0 fully inked in column B, everything else blank.
    #[test]
    fn single_marked_row_rest_no_answer() {
        let config = GridConfig::default();
        let mask = mask_with_marks(10, 4, 8, &[(0, 1)]);

        let answers = extract_answers(&mask, &config).unwrap();
        assert_eq!(answers[0], Answer::Choice(1));
        for row in 1..10 {
            assert_eq!(answers[row], Answer::NoAnswer, "row {row} should be blank");
        }
        assert_eq!(answers.to_letters(&config), "B?????????");
    }

    #[test]
    fn heaviest_cell_wins_the_row() {
        let config = GridConfig::new(1, 4, "ABCD").unwrap();
        // Column 2 has a full cell of ink, column 0 only a sliver.
        let mut gray = GrayImage::new(4 * 10, 10);
        for y in 0..10 {
            for x in 20..30 {
                gray.put_pixel(x, y, Luma([255u8]));
            }
        }
        gray.put_pixel(0, 0, Luma([255u8]));
        let mask = BinaryMask::from_gray(gray);

        let answers = extract_answers(&mask, &config).unwrap();
        assert_eq!(answers[0], Answer::Choice(2));
    }

    #[test]
    fn nonzero_tie_first_max_wins_by_default() {
        let config = GridConfig::default();
        assert_eq!(config.tie_policy, TiePolicy::FirstMaxWins);

        let mask = mask_with_marks(1, 4, 8, &[(0, 1), (0, 3)]);
        let config = GridConfig {
            rows: 1,
            ..config
        };
        let answers = extract_answers(&mask, &config).unwrap();
        assert_eq!(answers[0], Answer::Choice(1));
    }

    #[test]
    fn nonzero_tie_voids_row_under_no_answer_policy() {
        let config = GridConfig {
            rows: 1,
            tie_policy: TiePolicy::NoAnswer,
            ..GridConfig::default()
        };
        let mask = mask_with_marks(1, 4, 8, &[(0, 1), (0, 3)]);
        let answers = extract_answers(&mask, &config).unwrap();
        assert_eq!(answers[0], Answer::NoAnswer);
    }

    #[test]
    fn all_blank_row_is_no_answer_under_both_policies() {
        for tie_policy in [TiePolicy::FirstMaxWins, TiePolicy::NoAnswer] {
            let config = GridConfig {
                rows: 1,
                tie_policy,
                ..GridConfig::default()
            };
            let mask = mask_with_marks(1, 4, 8, &[]);
            let answers = extract_answers(&mask, &config).unwrap();
            assert_eq!(answers[0], Answer::NoAnswer);
        }
    }

    #[test]
    fn last_row_and_column_absorb_remainder_pixels() {
        // 103x47 frame, 10x4 grid: cells are 25x4 with 3 extra columns of
        // pixels in the last column and 7 extra rows in the last row.
        let grid = AnswerGrid::new(103, 47, 10, 4).unwrap();
        assert_eq!(grid.cell(0, 0).width(), 25);
        assert_eq!(grid.cell(0, 3).width(), 28);
        assert_eq!(grid.cell(0, 0).height(), 4);
        assert_eq!(grid.cell(9, 0).height(), 11);

        // Every pixel belongs to exactly one cell.
        let total: u64 = (0..10)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .map(|(r, c)| {
                let cell = grid.cell(r, c);
                cell.width() as u64 * cell.height() as u64
            })
            .sum();
        assert_eq!(total, 103 * 47);
    }

    #[test]
    fn grid_too_small_for_cells_is_rejected() {
        assert!(matches!(
            AnswerGrid::new(3, 100, 10, 4),
            Err(MarkwerkError::InvalidGrid(_))
        ));
        assert!(matches!(
            AnswerGrid::new(100, 100, 0, 4),
            Err(MarkwerkError::InvalidGrid(_))
        ));
    }

    #[test]
    fn select_answer_edge_cases() {
        assert_eq!(
            select_answer(&[0, 0, 0, 0], TiePolicy::FirstMaxWins),
            Answer::NoAnswer
        );
        assert_eq!(
            select_answer(&[5, 9, 9, 2], TiePolicy::FirstMaxWins),
            Answer::Choice(1)
        );
        assert_eq!(
            select_answer(&[5, 9, 9, 2], TiePolicy::NoAnswer),
            Answer::NoAnswer
        );
        assert_eq!(
            select_answer(&[5, 9, 8, 2], TiePolicy::NoAnswer),
            Answer::Choice(1)
        );
    }
}
