use std::path::Path;
use thiserror::Error;

use crate::config::{Config, PreprocessConfig};
use crate::extract::Extractor;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{Detection, FieldResult};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Orchestrates: preprocess → OCR → group lines → extract fields.
///
/// The recognizer is constructed once by the caller and reused for every
/// image. Nothing here fails outward: any error becomes a degraded
/// [`FieldResult`] whose text is an `Error: …` marker.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
    extractor: Extractor,
    preprocess: PreprocessConfig,
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, &Config::default())
    }

    pub fn with_config(recognizer: R, config: &Config) -> Self {
        Self {
            recognizer,
            extractor: Extractor::new(config.extraction.clone()),
            preprocess: config.preprocess.clone(),
        }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Extract structured fields from raw image bytes.
    pub fn extract_fields(&self, image: &[u8]) -> FieldResult {
        match self.detect(image) {
            Ok(detections) => self.extractor.extract(&detections),
            Err(e) => {
                tracing::warn!("Receipt extraction degraded: {e}");
                FieldResult::degraded(e)
            }
        }
    }

    /// Read an image from disk, then [`Self::extract_fields`].
    pub async fn extract_fields_from_path(&self, path: &Path) -> FieldResult {
        match tokio::fs::read(path).await {
            Ok(bytes) => self.extract_fields(&bytes),
            Err(e) => {
                tracing::warn!("Failed to read receipt {}: {e}", path.display());
                FieldResult::degraded(PipelineError::from(e))
            }
        }
    }

    /// Text-only variant: recognized tokens joined by spaces, or an `Error: …`
    /// marker.
    pub fn extract_text(&self, image: &[u8]) -> String {
        let tokens = self
            .prepare(image)
            .and_then(|bytes| self.recognizer.recognize_text(&bytes).map_err(PipelineError::from));
        match tokens {
            Ok(tokens) => tokens.join(" "),
            Err(e) => {
                tracing::warn!("Text recognition failed: {e}");
                format!("Error: {e}")
            }
        }
    }

    fn prepare(&self, image: &[u8]) -> Result<Vec<u8>, PipelineError> {
        Ok(preprocess::prepare_for_ocr(image, &self.preprocess)?)
    }

    fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, PipelineError> {
        let bytes = self.prepare(image)?;
        let detections = self.recognizer.detect(&bytes)?;
        tracing::debug!(detections = detections.len(), "OCR complete");
        Ok(detections)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
