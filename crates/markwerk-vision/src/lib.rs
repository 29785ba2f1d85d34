// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// markwerk-vision — Answer-sheet image processing for the Markwerk OMR engine.
//
// Provides the OMR scoring pipeline (adaptive binarization, grid extraction,
// scoring, result annotation), sheet photo utilities (crop, rotate, contrast,
// encode), and an optional perspective-correction pre-step for crooked photos.

pub mod image;
pub mod omr;
pub mod sheet;

// Re-export the primary types so callers can use `markwerk_vision::OmrChecker` etc.
pub use image::processor::SheetImage;
pub use omr::annotate::annotate;
pub use omr::grid::{extract_answers, AnswerGrid};
pub use omr::pipeline::{OmrChecker, OmrOutcome};
pub use omr::preprocess::{preprocess, BinaryMask};
pub use omr::score::score;
pub use sheet::align::deskew;

#[cfg(feature = "ocr")]
pub use sheet::ocr::OcrEngine;
