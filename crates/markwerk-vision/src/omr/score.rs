// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoring stage — per-row comparison of the student's answers against the key.

use markwerk_core::error::{MarkwerkError, Result};
use markwerk_core::types::{Answer, AnswerSequence, ScoreResult, Verdict};
use tracing::{debug, instrument};

/// Compare a student's answer sequence against the key, row by row.
///
/// A row is `Correct` when the student marked the key's choice, `Unanswered`
/// when the student marked nothing (regardless of the key), and `Incorrect`
/// otherwise — including rows where the key itself is blank but the student
/// marked something.
///
/// Pure and deterministic; the only failure is a length mismatch between the
/// two sequences, which cannot happen when both came from the same
/// `GridConfig` but is guarded anyway.
#[instrument(skip_all, fields(rows = key.len()))]
pub fn score(key: &AnswerSequence, student: &AnswerSequence) -> Result<ScoreResult> {
    if key.len() != student.len() {
        return Err(MarkwerkError::RowCountMismatch {
            key: key.len(),
            student: student.len(),
        });
    }

    let per_row: Vec<Verdict> = key
        .iter()
        .zip(student.iter())
        .map(|(key_answer, student_answer)| match student_answer {
            Answer::NoAnswer => Verdict::Unanswered,
            answer if answer == key_answer => Verdict::Correct,
            _ => Verdict::Incorrect,
        })
        .collect();

    let correct_count = per_row
        .iter()
        .filter(|v| matches!(v, Verdict::Correct))
        .count();

    debug!(correct_count, total = per_row.len(), "Scoring complete");
    Ok(ScoreResult {
        correct_count,
        total_rows: per_row.len(),
        per_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use markwerk_core::types::GridConfig;

    fn seq(letters: &str) -> AnswerSequence {
        AnswerSequence::from_letters(letters, &GridConfig::default())
    }

    #[test]
    fn key_against_itself_is_a_full_score() {
        let key = seq("ABCDABCDAB");
        let result = score(&key, &key).unwrap();
        assert_eq!(result.correct_count, result.total_rows);
        assert!(result.per_row.iter().all(|v| matches!(v, Verdict::Correct)));
    }

    /// Key ABCD vs student: right, wrong, right, blank.
    #[test]
    fn mixed_verdicts() {
        let key = seq("ABCD");
        let student = seq("ADC?");
        let result = score(&key, &student).unwrap();

        assert_eq!(
            result.per_row,
            vec![
                Verdict::Correct,
                Verdict::Incorrect,
                Verdict::Correct,
                Verdict::Unanswered,
            ]
        );
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.to_string(), "Score: 2/4");
    }

    #[test]
    fn student_blank_is_unanswered_even_when_key_is_blank() {
        let key = seq("?A");
        let student = seq("?A");
        let result = score(&key, &student).unwrap();
        // A blank student row is never "correct", even against a blank key.
        assert_eq!(result.per_row[0], Verdict::Unanswered);
        assert_eq!(result.per_row[1], Verdict::Correct);
        assert_eq!(result.correct_count, 1);
    }

    #[test]
    fn student_mark_against_blank_key_is_incorrect() {
        let key = seq("?");
        let student = seq("B");
        let result = score(&key, &student).unwrap();
        assert_eq!(result.per_row[0], Verdict::Incorrect);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let key = seq("ABCD");
        let student = seq("ABC");
        assert!(matches!(
            score(&key, &student),
            Err(MarkwerkError::RowCountMismatch { key: 4, student: 3 })
        ));
    }

    #[test]
    fn empty_sequences_score_zero_of_zero() {
        let key = seq("");
        let student = seq("");
        let result = score(&key, &student).unwrap();
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.percent(), 0.0);
    }
}
