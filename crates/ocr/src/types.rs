use serde::{Deserialize, Serialize};

/// A single image-space vertex of a detection polygon.
pub type Point = [i32; 2];

/// One OCR hit, as returned by the recognition backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    /// Bounding polygon, usually the four corners of the word box.
    #[serde(default)]
    pub polygon: Vec<Point>,
    pub text: String,
    /// Recognition confidence (0.0–1.0).
    #[serde(default)]
    pub confidence: f32,
}

impl Detection {
    pub fn new(polygon: Vec<Point>, text: impl Into<String>, confidence: f32) -> Self {
        Self { polygon, text: text.into(), confidence: confidence.clamp(0.0, 1.0) }
    }

    /// Axis-aligned box helper, mostly for backends that report `left/top/width/height`.
    pub fn from_rect(left: i32, top: i32, width: i32, height: i32, text: impl Into<String>, confidence: f32) -> Self {
        let (right, bottom) = (left + width, top + height);
        Self::new(
            vec![[left, top], [right, top], [right, bottom], [left, bottom]],
            text,
            confidence,
        )
    }

    /// Mean y-coordinate of the polygon, or 0.0 when there is no geometry.
    pub fn vertical_center(&self) -> f64 {
        if self.polygon.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.polygon.iter().map(|p| f64::from(p[1])).sum();
        sum / self.polygon.len() as f64
    }
}

/// Detections that share a horizontal band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    pub vertical_position: f64,
    pub text: String,
    pub tokens: Vec<String>,
}

/// Which total rule produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TotalStrategy {
    KeywordBottommost,
    GlobalMax,
}

impl std::fmt::Display for TotalStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TotalStrategy::KeywordBottommost => write!(f, "keyword_bottommost"),
            TotalStrategy::GlobalMax => write!(f, "global_max"),
        }
    }
}

/// A possible grand total found while scanning lines.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountCandidate {
    pub line_index: usize,
    pub vertical_position: f64,
    pub amount_text: String,
    /// Always non-negative; failed normalization shows up as 0.0.
    pub amount: f64,
    pub strategy: TotalStrategy,
}

/// The selected total, as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TotalField {
    pub amount: f64,
    pub amount_text: String,
    pub line_index: usize,
    pub line_text: String,
    pub strategy: TotalStrategy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptType {
    Grocery,
    Restaurant,
    Fuel,
    Utilities,
    Pharmacy,
    Transportation,
    Shopping,
    Online,
    /// Nothing matched.
    General,
    /// More than one keyword set matched.
    Mixed,
}

impl std::fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReceiptType::Grocery => "grocery",
            ReceiptType::Restaurant => "restaurant",
            ReceiptType::Fuel => "fuel",
            ReceiptType::Utilities => "utilities",
            ReceiptType::Pharmacy => "pharmacy",
            ReceiptType::Transportation => "transportation",
            ReceiptType::Shopping => "shopping",
            ReceiptType::Online => "online",
            ReceiptType::General => "general",
            ReceiptType::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TypeConfidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptTypeResult {
    #[serde(rename = "type")]
    pub primary: ReceiptType,
    pub all_types: Vec<ReceiptType>,
    pub confidence: TypeConfidence,
}

impl Default for ReceiptTypeResult {
    fn default() -> Self {
        Self { primary: ReceiptType::General, all_types: vec![], confidence: TypeConfidence::Low }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Fields {
    pub total: Option<TotalField>,
    pub receipt_type: ReceiptTypeResult,
    pub vendor: String,
    pub date: String,
}

/// Everything extracted from one receipt image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldResult {
    pub text: String,
    pub lines: Vec<Line>,
    pub fields: Fields,
}

impl FieldResult {
    /// Result used when recognition could not run: only an error marker survives.
    pub fn degraded(message: impl std::fmt::Display) -> Self {
        Self { text: format!("Error: {message}"), ..Self::default() }
    }

    pub fn is_degraded(&self) -> bool {
        self.lines.is_empty() && self.text.starts_with("Error: ")
    }
}
