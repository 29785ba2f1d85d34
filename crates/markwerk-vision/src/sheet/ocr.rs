// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) for answer-sheet headers.
//
// Reads the handwritten or printed name/ID line at the top of a sheet photo
// using the `ocrs` crate, a pure-Rust OCR engine backed by neural network
// models executed via `rten`. The recognition models are external
// collaborators: nothing here implements recognition itself.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// markwerk-vision = { path = "crates/markwerk-vision", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files, downloadable from the ocrs-models
// releases or fetched automatically by running the `ocrs-cli` tool once:
//
// - `text-detection.rten` — locates text regions in the image.
// - `text-recognition.rten` — decodes characters from detected regions.
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use image::DynamicImage;
use markwerk_core::error::{MarkwerkError, Result};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
/// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        // Last resort — current directory.
        PathBuf::from("ocrs-models")
    }
}

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Share of the sheet height treated as the header when none is given.
const DEFAULT_HEADER_FRACTION: f32 = 0.15;

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    /// Returns a config pointing at the default model cache directory.
    fn default() -> Self {
        let dir = default_model_dir();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }
}

impl OcrConfig {
    /// Create a config with an explicit model directory.
    ///
    /// Expects the directory to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Create a config pointing at two specific model files.
    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        if !self.detection_model_path.exists() {
            return Err(MarkwerkError::Ocr(format!(
                "detection model not found at {}; run `ocrs-cli` once to download models",
                self.detection_model_path.display()
            )));
        }
        if !self.recognition_model_path.exists() {
            return Err(MarkwerkError::Ocr(format!(
                "recognition model not found at {}; run `ocrs-cli` once to download models",
                self.recognition_model_path.display()
            )));
        }
        Ok(())
    }
}

/// Reads text off answer-sheet photos.
///
/// Wraps the `ocrs` engine with Markwerk error handling and logging. Model
/// loading is the expensive step — keep the engine around and call
/// [`read_header`](Self::read_header) per sheet. Each engine is an
/// independent value; callers pool them explicitly if they want reuse.
pub struct OcrEngine {
    /// The underlying `ocrs` engine instance.
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Create a new OCR engine, loading models from the paths in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkwerkError::Ocr`] if model files are missing or corrupt.
    ///
    /// # Performance
    ///
    /// The `ocrs` and `rten` crates must be compiled in release mode; debug
    /// builds are 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            MarkwerkError::Ocr(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                MarkwerkError::Ocr(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| MarkwerkError::Ocr(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Create an OCR engine using the default model cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }

    /// Create an OCR engine loading models from a specific directory.
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(OcrConfig::from_dir(dir))
    }

    /// Extract all text from a sheet photo.
    ///
    /// Returns the recognised text as a single `String` with lines separated
    /// by newlines. The input is converted to RGB8 internally if needed.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            MarkwerkError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| MarkwerkError::Ocr(format!("OCR preprocessing failed: {}", err)))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| MarkwerkError::Ocr(format!("OCR text recognition failed: {}", err)))?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }

    /// Read the name/ID line from the top of a sheet photo.
    ///
    /// Crops the top `header_fraction` of the photo (defaulting to
    /// [`DEFAULT_HEADER_FRACTION`] when `None`) and recognises the text in
    /// it, returning the trimmed result. An empty string means the header
    /// was blank or unreadable — that is a result, not an error.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn read_header(
        &self,
        image: &DynamicImage,
        header_fraction: Option<f32>,
    ) -> Result<String> {
        let fraction = header_fraction
            .unwrap_or(DEFAULT_HEADER_FRACTION)
            .clamp(0.01, 1.0);
        let header_height = ((image.height() as f32 * fraction) as u32).max(1);
        let header = image.crop_imm(0, 0, image.width(), header_height);

        debug!(header_height, "Reading sheet header");
        let text = self.recognize_text(&header)?;
        Ok(text.trim().to_string())
    }
}

/// Check whether OCR model files exist in the default cache location.
pub fn models_available() -> bool {
    let config = OcrConfig::default();
    config.detection_model_path.exists() && config.recognition_model_path.exists()
}

/// The default model directory path (for display in UI / diagnostics).
pub fn model_directory() -> PathBuf {
    default_model_dir()
}
