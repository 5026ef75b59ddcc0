use thiserror::Error;

use crate::types::Detection;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Abstraction over an OCR backend.
///
/// Implementations accept raw PNG/JPEG image bytes. The handle is built once
/// and reused for every image, so expensive model loading belongs in the
/// constructor.
pub trait OcrBackend: Send + Sync {
    /// Detail mode: every recognized token with its polygon and confidence.
    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, OcrError>;

    /// Text-only mode: the recognized tokens, nothing else.
    fn recognize_text(&self, image_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
        Ok(self.detect(image_bytes)?.into_iter().map(|d| d.text).collect())
    }
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, OcrError> {
        (**self).detect(image_bytes)
    }

    fn recognize_text(&self, image_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
        (**self).recognize_text(image_bytes)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set batch of detections, ignoring the image entirely.
pub struct MockRecognizer {
    pub detections: Vec<Detection>,
}

impl MockRecognizer {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// One full-width detection per line, 30px apart.
    pub fn from_lines(lines: &[&str]) -> Self {
        let detections = lines
            .iter()
            .zip(0..)
            .map(|(text, row)| Detection::from_rect(10, 10 + row * 30, 300, 20, *text, 0.99))
            .collect();
        Self { detections }
    }
}

impl OcrBackend for MockRecognizer {
    fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<Detection>, OcrError> {
        Ok(self.detections.clone())
    }
}

// ── Tesseract TSV ─────────────────────────────────────────────────────────────

/// Parse Tesseract's TSV output into word-level detections.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Only level-5 (word) rows with non-blank text are kept;
/// malformed rows are skipped.
pub fn parse_tesseract_tsv(tsv: &str) -> Vec<Detection> {
    tsv.lines()
        .filter_map(|row| {
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }
            let left: i32 = cols[6].parse().ok()?;
            let top: i32 = cols[7].parse().ok()?;
            let width: i32 = cols[8].parse().ok()?;
            let height: i32 = cols[9].parse().ok()?;
            let conf: f32 = cols[10].parse().ok()?;
            Some(Detection::from_rect(left, top, width, height, text, conf / 100.0))
        })
        .collect()
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{parse_tesseract_tsv, OcrBackend, OcrError};
    use crate::config::TesseractConfig;
    use crate::types::Detection;
    use leptess::LepTess;
    use std::sync::{Mutex, MutexGuard};

    /// One Tesseract engine, loaded at construction and shared by every call.
    pub struct TesseractRecognizer {
        engine: Mutex<LepTess>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<&str>, lang: &str) -> Result<Self, OcrError> {
            let engine = LepTess::new(data_path, lang).map_err(|e| OcrError::Engine(e.to_string()))?;
            tracing::debug!(lang, "Tesseract engine loaded");
            Ok(Self { engine: Mutex::new(engine) })
        }

        pub fn from_config(config: &TesseractConfig) -> Result<Self, OcrError> {
            Self::new(config.data_path.as_deref(), &config.lang)
        }

        fn load_image(&self, image_bytes: &[u8]) -> Result<MutexGuard<'_, LepTess>, OcrError> {
            let mut lt = self
                .engine
                .lock()
                .map_err(|_| OcrError::Engine("Tesseract engine lock poisoned".into()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            Ok(lt)
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn detect(&self, image_bytes: &[u8]) -> Result<Vec<Detection>, OcrError> {
            let mut lt = self.load_image(image_bytes)?;
            let tsv = lt.get_tsv_text(0).map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(parse_tesseract_tsv(&tsv))
        }

        fn recognize_text(&self, image_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
            let mut lt = self.load_image(image_bytes)?;
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(text.split_whitespace().map(str::to_string).collect())
        }
    }
}
