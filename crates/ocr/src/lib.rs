pub mod classify;
pub mod config;
pub mod extract;
pub mod grouping;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use classify::classify_receipt;
pub use config::{Config, ConfigError, ExtractionConfig, PreprocessConfig, TesseractConfig};
pub use extract::{extract_date, parse_receipt_date, Extractor};
pub use grouping::{group_lines, DEFAULT_LINE_THRESHOLD_PX};
pub use pipeline::{PipelineError, ReceiptPipeline};
pub use preprocess::{prepare_for_ocr, PreprocessError};
pub use recognizer::{parse_tesseract_tsv, MockRecognizer, OcrBackend, OcrError};
pub use types::{
    AmountCandidate, Detection, FieldResult, Fields, Line, Point, ReceiptType, ReceiptTypeResult,
    TotalField, TotalStrategy, TypeConfidence,
};
