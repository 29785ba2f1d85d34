// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OMR pipeline — turns a photographed bubble sheet into per-question answers,
// scores them against a key, and renders an annotated result image.
//
// Stage order: preprocess (binarize) -> extract (grid voting) -> score ->
// annotate. The orchestrating [`pipeline::OmrChecker`] wires the stages
// together and tags any failure with the stage it happened in.

pub mod annotate;
pub mod grid;
pub mod pipeline;
pub mod preprocess;
pub mod score;

pub use annotate::annotate;
pub use grid::{extract_answers, AnswerGrid};
pub use pipeline::{OmrChecker, OmrOutcome};
pub use preprocess::{preprocess, BinaryMask};
pub use score::score;
