// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for non-technical users (teachers, students).
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses three severity levels that drive UI presentation.

use crate::error::{MarkwerkError, OmrStage};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A retake or retry can fix it — bad photo, blurry scan.
    Transient,
    /// User must change something (settings, the right image pair).
    ActionRequired,
    /// Cannot be fixed by retrying — corrupt file, wrong format.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same operation again makes sense.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `MarkwerkError` into a `HumanError` anyone can act on.
pub fn humanize_error(err: &MarkwerkError) -> HumanError {
    match err {
        MarkwerkError::ImageDecode(_) => HumanError {
            message: "There's a problem with this photo.".into(),
            suggestion: "The image may be damaged or in an unusual format. Take the photo again, or save it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MarkwerkError::ImageEncode(_) => HumanError {
            message: "The result image couldn't be saved.".into(),
            suggestion: "Check that there is space on the device, then run the check again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MarkwerkError::InvalidGrid(detail) => HumanError {
            message: "The answer-sheet layout settings don't add up.".into(),
            suggestion: format!(
                "Check the number of questions, choices, and choice letters in Settings — there must be one letter per choice. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::RowCountMismatch { key, student } => HumanError {
            message: "The two sheets have different numbers of questions.".into(),
            suggestion: format!(
                "The answer key has {key} questions but the student sheet has {student}. Make sure both photos use the same sheet layout, then try again."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MarkwerkError::Omr { stage, .. } => humanize_stage_error(*stage),

        MarkwerkError::Ocr(_) => HumanError {
            message: "Text recognition didn't work on this photo.".into(),
            suggestion: "Try taking the photo again with better lighting, making sure the writing is clear and in focus.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MarkwerkError::Io(_) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: "Check that the file exists and that there is space on the device, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MarkwerkError::Serialization(_) => HumanError {
            message: "The results couldn't be saved in a readable format.".into(),
            suggestion: "This is a bug worth reporting — the check itself succeeded.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Stage-specific messages for OMR pipeline failures.
fn humanize_stage_error(stage: OmrStage) -> HumanError {
    match stage {
        OmrStage::Preprocess => HumanError {
            message: "We couldn't read this photo clearly.".into(),
            suggestion: "Retake the photo in good light, holding the camera flat above the sheet.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        OmrStage::Extract => HumanError {
            message: "We couldn't find the answer bubbles.".into(),
            suggestion: "Crop the photo so the bubble grid fills the frame, with the sheet straight and not at an angle.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        OmrStage::Score => HumanError {
            message: "The sheets couldn't be compared.".into(),
            suggestion: "Make sure the key photo and the student photo are from the same sheet layout.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        OmrStage::Annotate => HumanError {
            message: "We couldn't draw the results onto the photo.".into(),
            suggestion: "The score itself is fine — try running the check again to get the marked-up image.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
