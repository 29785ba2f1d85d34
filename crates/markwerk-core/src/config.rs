// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::types::{GridConfig, TiePolicy};

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default number of question rows on a sheet.
    pub default_rows: u32,
    /// Default number of choice columns per question.
    pub default_cols: u32,
    /// Default choice labels, left to right.
    pub choice_labels: Vec<String>,
    /// Tie-breaking policy for cell selection.
    pub tie_policy: TiePolicy,
    /// Run perspective correction on sheet photos before extraction.
    pub deskew_enabled: bool,
    /// Keep the annotated result image after a check.
    pub save_annotated: bool,
    /// JPEG quality (1-100) when the annotated image is exported as JPEG.
    pub annotated_jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_rows: 10,
            default_cols: 4,
            choice_labels: ["A", "B", "C", "D"].map(String::from).to_vec(),
            tie_policy: TiePolicy::default(),
            deskew_enabled: false,
            save_annotated: true,
            annotated_jpeg_quality: 90,
        }
    }
}

impl AppConfig {
    /// The grid configuration these settings describe.
    pub fn grid(&self) -> GridConfig {
        GridConfig {
            rows: self.default_rows,
            cols: self.default_cols,
            choice_labels: self.choice_labels.clone(),
            tie_policy: self.tie_policy,
        }
    }
}
