// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Markwerk.

use thiserror::Error;

/// The pipeline stage at which an OMR check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OmrStage {
    /// Grayscale / blur / adaptive binarization of an input photo.
    Preprocess,
    /// Grid partitioning and per-cell ink voting.
    Extract,
    /// Comparing the student's answers against the key.
    Score,
    /// Rendering result markers onto the student photo.
    Annotate,
}

impl std::fmt::Display for OmrStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preprocess => "preprocess",
            Self::Extract => "extract",
            Self::Score => "score",
            Self::Annotate => "annotate",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all Markwerk operations.
#[derive(Debug, Error)]
pub enum MarkwerkError {
    // -- Input errors --
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("image encode failed: {0}")]
    ImageEncode(String),

    #[error("invalid grid configuration: {0}")]
    InvalidGrid(String),

    // -- OMR pipeline errors --
    #[error("answer row count mismatch: key has {key} rows, student has {student}")]
    RowCountMismatch { key: usize, student: usize },

    #[error("OMR check failed at the {stage} stage: {cause}")]
    Omr { stage: OmrStage, cause: String },

    // -- Collaborator errors --
    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MarkwerkError {
    /// Wrap any error as a stage failure, preserving only its message.
    ///
    /// Stage failures are non-retryable and carry an opaque cause — callers
    /// dispatch on the stage, not on the inner error.
    pub fn at_stage(stage: OmrStage, cause: impl std::fmt::Display) -> Self {
        Self::Omr {
            stage,
            cause: cause.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MarkwerkError>;
