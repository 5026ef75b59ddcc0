use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::grouping::DEFAULT_LINE_THRESHOLD_PX;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for the post-OCR heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum center-to-center distance for detections on the same line.
    pub line_threshold_px: f64,
    /// How many leading lines the vendor heuristic looks at.
    pub vendor_scan_lines: usize,
    /// Inclusive bounds for amounts accepted by the global fallback.
    pub min_plausible_amount: f64,
    pub max_plausible_amount: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            line_threshold_px: DEFAULT_LINE_THRESHOLD_PX,
            vendor_scan_lines: 3,
            min_plausible_amount: 0.05,
            max_plausible_amount: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    pub enabled: bool,
    /// Images larger than this on either side are scaled down before OCR.
    pub max_dimension: u32,
    pub contrast_stretch: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { enabled: true, max_dimension: 2800, contrast_stretch: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TesseractConfig {
    pub data_path: Option<String>,
    pub lang: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self { data_path: None, lang: "eng".to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub preprocess: PreprocessConfig,
    pub tesseract: TesseractConfig,
}

impl Config {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
