// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestration — sequences preprocess, extract, score, and
// annotate for one key/student photo pair.

use image::DynamicImage;
use markwerk_core::error::{MarkwerkError, OmrStage, Result};
use markwerk_core::types::{AnswerSequence, GridConfig, ScoreRecord, ScoreResult};
use tracing::{info, instrument};

use crate::omr::annotate::annotate;
use crate::omr::grid::extract_answers;
use crate::omr::preprocess::preprocess;
use crate::omr::score::score;

/// Everything one OMR check produces.
#[derive(Debug, Clone)]
pub struct OmrOutcome {
    /// Answers read off the reference key sheet.
    pub key_answers: AnswerSequence,
    /// Answers read off the student's sheet.
    pub student_answers: AnswerSequence,
    /// Per-row verdicts and the total.
    pub score: ScoreResult,
    /// The student's photo with result markers drawn on.
    pub annotated: DynamicImage,
}

impl OmrOutcome {
    /// Build a serialisable report of this outcome.
    pub fn record(&self, config: &GridConfig, student_image_digest: Option<String>) -> ScoreRecord {
        ScoreRecord::new(
            config,
            &self.key_answers,
            &self.student_answers,
            self.score.clone(),
            student_image_digest,
        )
    }
}

/// Runs the complete OMR check: two photos in, a score and an annotated
/// image out.
///
/// A checker is a plain value with no shared state — construct one per
/// invocation, or keep one around and reuse it; concurrent checks on
/// independent images need no locking. The pipeline itself is synchronous
/// and never blocks on I/O; running it off the UI thread is the caller's
/// concern.
#[derive(Debug, Clone)]
pub struct OmrChecker {
    config: GridConfig,
}

impl OmrChecker {
    /// Create a checker for the given grid layout.
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Checker for the standard 10-question, four-choice sheet.
    pub fn with_defaults() -> Self {
        Self {
            config: GridConfig::default(),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Run the full check: binarize both photos, extract both answer
    /// sequences with the shared grid layout, score the student against the
    /// key, and draw the result markers onto the student's original colour
    /// photo (grid re-derived from that photo's own dimensions).
    ///
    /// Any stage failure short-circuits into [`MarkwerkError::Omr`] naming
    /// the stage; no partial results are ever returned.
    #[instrument(skip_all, fields(
        rows = self.config.rows,
        cols = self.config.cols,
        key_w = key_image.width(),
        key_h = key_image.height(),
        student_w = student_image.width(),
        student_h = student_image.height(),
    ))]
    pub fn run(
        &self,
        key_image: &DynamicImage,
        student_image: &DynamicImage,
    ) -> Result<OmrOutcome> {
        info!("Starting OMR check");

        let key_mask = preprocess(key_image)
            .map_err(|err| MarkwerkError::at_stage(OmrStage::Preprocess, err))?;
        let student_mask = preprocess(student_image)
            .map_err(|err| MarkwerkError::at_stage(OmrStage::Preprocess, err))?;

        let key_answers = extract_answers(&key_mask, &self.config)
            .map_err(|err| MarkwerkError::at_stage(OmrStage::Extract, err))?;
        let student_answers = extract_answers(&student_mask, &self.config)
            .map_err(|err| MarkwerkError::at_stage(OmrStage::Extract, err))?;

        let score = score(&key_answers, &student_answers)
            .map_err(|err| MarkwerkError::at_stage(OmrStage::Score, err))?;

        let annotated = annotate(student_image, &self.config, &key_answers, &student_answers)
            .map_err(|err| MarkwerkError::at_stage(OmrStage::Annotate, err))?;

        info!(%score, "OMR check complete");
        Ok(OmrOutcome {
            key_answers,
            student_answers,
            score,
            annotated,
        })
    }
}
