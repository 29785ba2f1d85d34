// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Markwerk OMR engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarkwerkError, Result};

/// Unique identifier for one OMR check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckId(pub Uuid);

impl CheckId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CheckId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do when two or more columns in a row tie for the maximum ink count.
///
/// A tie at zero ink always yields [`Answer::NoAnswer`] regardless of policy —
/// an unmarked row has no winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TiePolicy {
    /// The leftmost column reaching the maximum wins. This is the behaviour
    /// of a strict `count > max` scan and the default.
    #[default]
    FirstMaxWins,
    /// Any multi-way tie at a nonzero maximum counts as no answer.
    NoAnswer,
}

/// Layout of the bubble grid on an answer sheet, shared by the key and the
/// student sheet within one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of question rows on the sheet.
    pub rows: u32,
    /// Number of choice columns per question.
    pub cols: u32,
    /// Label for each choice column, left to right. Must have exactly
    /// `cols` entries.
    pub choice_labels: Vec<String>,
    /// Tie-breaking policy for cell selection.
    pub tie_policy: TiePolicy,
}

impl Default for GridConfig {
    /// The standard 10-question, four-choice sheet labelled A-D.
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 4,
            choice_labels: ["A", "B", "C", "D"].map(String::from).to_vec(),
            tie_policy: TiePolicy::default(),
        }
    }
}

impl GridConfig {
    /// Create a config with the given dimensions and single-character labels
    /// taken from `labels` (e.g. `"ABCD"`).
    pub fn new(rows: u32, cols: u32, labels: &str) -> Result<Self> {
        let config = Self {
            rows,
            cols,
            choice_labels: labels.chars().map(String::from).collect(),
            tie_policy: TiePolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the grid dimensions and labels are usable.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(MarkwerkError::InvalidGrid(format!(
                "grid must have at least one row and one column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.choice_labels.len() != self.cols as usize {
            return Err(MarkwerkError::InvalidGrid(format!(
                "{} choice labels for {} columns — one label per column required",
                self.choice_labels.len(),
                self.cols
            )));
        }
        if self.choice_labels.iter().any(|label| label.is_empty()) {
            return Err(MarkwerkError::InvalidGrid(
                "choice labels must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Label for a choice column, or `None` if the index is out of range.
    pub fn label_for(&self, column: usize) -> Option<&str> {
        self.choice_labels.get(column).map(String::as_str)
    }

    /// Column index for a label, matched case-sensitively.
    pub fn column_for(&self, label: &str) -> Option<usize> {
        self.choice_labels.iter().position(|l| l == label)
    }
}

/// One row's extracted answer: either a chosen column or nothing marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// The student (or key) marked this choice column.
    Choice(usize),
    /// No cell in the row was marked, or the tie policy voided the row.
    NoAnswer,
}

impl Answer {
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Choice(_))
    }

    /// The chosen column index, if any.
    pub fn choice_index(&self) -> Option<usize> {
        match self {
            Self::Choice(index) => Some(*index),
            Self::NoAnswer => None,
        }
    }
}

/// Placeholder used for [`Answer::NoAnswer`] in letter renderings.
pub const NO_ANSWER_GLYPH: char = '?';

/// Ordered per-row answers extracted from one sheet, one entry per grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSequence(Vec<Answer>);

impl AnswerSequence {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self(answers)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Answer> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Answer] {
        &self.0
    }

    /// Render as one letter per row, e.g. `"ABDA?CBBAD"`, with
    /// [`NO_ANSWER_GLYPH`] for unanswered rows. Columns without a configured
    /// label also render as the placeholder.
    pub fn to_letters(&self, config: &GridConfig) -> String {
        self.0
            .iter()
            .map(|answer| match answer.choice_index().and_then(|i| config.label_for(i)) {
                Some(label) => label.to_string(),
                None => NO_ANSWER_GLYPH.to_string(),
            })
            .collect()
    }

    /// Parse a letter rendering back into a sequence. `?` (or any character
    /// not in the label set) becomes [`Answer::NoAnswer`].
    pub fn from_letters(letters: &str, config: &GridConfig) -> Self {
        let answers = letters
            .chars()
            .map(|c| match config.column_for(&c.to_string()) {
                Some(index) => Answer::Choice(index),
                None => Answer::NoAnswer,
            })
            .collect();
        Self(answers)
    }
}

impl From<Vec<Answer>> for AnswerSequence {
    fn from(answers: Vec<Answer>) -> Self {
        Self(answers)
    }
}

impl std::ops::Index<usize> for AnswerSequence {
    type Output = Answer;

    fn index(&self, row: usize) -> &Answer {
        &self.0[row]
    }
}

impl<'a> IntoIterator for &'a AnswerSequence {
    type Item = &'a Answer;
    type IntoIter = std::slice::Iter<'a, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-row classification of the student's answer against the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Student marked the key's choice.
    Correct,
    /// Student marked a different choice than the key.
    Incorrect,
    /// Student left the row unmarked (or the row was voided).
    Unanswered,
}

/// Outcome of scoring one student sheet against a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Number of rows judged [`Verdict::Correct`].
    pub correct_count: usize,
    /// Total number of question rows compared.
    pub total_rows: usize,
    /// Verdict for each row, in sheet order.
    pub per_row: Vec<Verdict>,
}

impl ScoreResult {
    /// Score as a percentage in [0, 100]. An empty sheet scores 0.
    pub fn percent(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.correct_count as f64 * 100.0 / self.total_rows as f64
    }

    /// How many rows the student left unanswered.
    pub fn unanswered_count(&self) -> usize {
        self.per_row
            .iter()
            .filter(|v| matches!(v, Verdict::Unanswered))
            .count()
    }
}

impl std::fmt::Display for ScoreResult {
    /// The result string shown to the user, e.g. `Score: 7/10`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score: {}/{}", self.correct_count, self.total_rows)
    }
}

/// Serialisable report of one completed OMR check.
///
/// Carries everything a front-end needs to display or export the result;
/// the annotated image itself travels separately as pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: CheckId,
    pub created_at: DateTime<Utc>,
    /// SHA-256 hex digest of the student photo's encoded bytes, when the
    /// caller had access to them.
    pub student_image_digest: Option<String>,
    /// Key answers as letters (see [`AnswerSequence::to_letters`]).
    pub key_answers: String,
    /// Student answers as letters.
    pub student_answers: String,
    pub score: ScoreResult,
}

impl ScoreRecord {
    pub fn new(
        config: &GridConfig,
        key: &AnswerSequence,
        student: &AnswerSequence,
        score: ScoreResult,
        student_image_digest: Option<String>,
    ) -> Self {
        Self {
            id: CheckId::new(),
            created_at: Utc::now(),
            student_image_digest,
            key_answers: key.to_letters(config),
            student_answers: student.to_letters(config),
            score,
        }
    }
}
