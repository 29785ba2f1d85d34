// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet-level collaborators that run outside the core OMR pipeline:
// perspective correction for crooked photos, and optical character
// recognition (OCR) for the handwritten header.

pub mod align;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use align::deskew;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
