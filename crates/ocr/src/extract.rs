use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use scrip_core::normalize_amount;

use crate::classify::classify_receipt;
use crate::config::ExtractionConfig;
use crate::grouping::group_lines;
use crate::types::{AmountCandidate, Detection, FieldResult, Fields, Line, TotalField, TotalStrategy};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Amount patterns, tried in this order. Group 1 is the bare numeral.
re!(re_amount_currency,
    r"(?:\b(?:USD|EUR|GBP|CAD|AUD|NZD|CHF|JPY|CNY|INR|SGD|HKD|MXN|SEK|NOK|DKK|PLN|ZAR|AED) ?|[$€£¥₹] ?)?((?:\d{1,3}(?:[, ]\d{3})+|\d+)\.\d{2})\b");
re!(re_amount_us,
    r"\b((?:\d{1,3}(?:,\d{3})+|\d+)\.\d{1,2})\b");
re!(re_amount_eu,
    r"\b((?:\d{1,3}(?:\.\d{3})+|\d+),\d{2})\b");

re!(re_fallback_noise,
    r"(?i)(?:visa|mastercard|amex|card|auth|approval|invoice|gst|vat|tax|tel|phone)");

re!(re_date_iso,
    r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b");
re!(re_date_numeric,
    r"\b\d{1,2}[-/]\d{1,2}[-/]\d{4}\b");
re!(re_date_textual,
    r"(?i)\b(\d{1,2})\s+((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*)\.?,?\s+(\d{4})\b");

const TOTAL_HINTS: &[&str] = &[
    "grand total",
    "total",
    "amount due",
    "balance due",
    "total due",
    "cash total",
    "bill total",
    "amount payable",
    "net total",
];

// Labels that contain a total hint but are not the grand total.
const NOT_TOTAL_HINTS: &[&str] = &[
    "subtotal",
    "sub total",
    "total items",
    "total qty",
    "total points",
    "total savings",
    "savings total",
    "tax total",
];

/// Total-selection rules in priority order; the first one producing a candidate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TotalRule {
    /// Bottom-most amount on a line labelled as a total.
    Keyword,
    /// Largest plausible amount anywhere outside payment/tax noise.
    Fallback,
}

const TOTAL_RULES: [TotalRule; 2] = [TotalRule::Keyword, TotalRule::Fallback];

impl TotalRule {
    fn apply(self, lines: &[Line], config: &ExtractionConfig) -> Option<AmountCandidate> {
        match self {
            TotalRule::Keyword => keyword_bottommost(lines),
            TotalRule::Fallback => global_max(lines, config),
        }
    }
}

// ── Public extraction API ─────────────────────────────────────────────────────

/// Turns a batch of detections into a [`FieldResult`]. Holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Group, then run every field heuristic. `detections` must be in the
    /// backend's native order; the plain text keeps that order.
    pub fn extract(&self, detections: &[Detection]) -> FieldResult {
        let text = detections
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let lines = group_lines(detections, self.config.line_threshold_px);

        let fields = Fields {
            total: self.extract_total(&lines),
            receipt_type: classify_receipt(&text),
            vendor: self.extract_vendor(&lines),
            date: extract_date(&text),
        };

        FieldResult { text, lines, fields }
    }

    // ── Total ─────────────────────────────────────────────────────────────────

    pub fn extract_total(&self, lines: &[Line]) -> Option<TotalField> {
        let candidate = TOTAL_RULES
            .iter()
            .find_map(|rule| rule.apply(lines, &self.config));

        match &candidate {
            Some(c) => tracing::debug!(strategy = %c.strategy, amount = c.amount, line = c.line_index, "total selected"),
            None => tracing::debug!("no total candidate"),
        }

        candidate.map(|c| TotalField {
            amount: c.amount,
            amount_text: c.amount_text,
            line_index: c.line_index,
            line_text: lines[c.line_index].text.clone(),
            strategy: c.strategy,
        })
    }

    // ── Vendor ────────────────────────────────────────────────────────────────

    /// Prefer an all-caps header line among the first few; otherwise the first
    /// word of the first non-empty one.
    pub fn extract_vendor(&self, lines: &[Line]) -> String {
        let head = &lines[..lines.len().min(self.config.vendor_scan_lines)];

        for line in head {
            let trimmed = line.text.trim();
            if trimmed.chars().count() <= 3 || !is_upper_case(trimmed) {
                continue;
            }
            let letters: String = trimmed
                .chars()
                .filter(|c| c.is_ascii_uppercase() || c.is_whitespace())
                .collect();
            let letters = letters.trim();
            if letters.chars().count() >= 3 {
                return letters.to_string();
            }
        }

        head.iter()
            .map(|l| l.text.trim())
            .find(|t| !t.is_empty())
            .and_then(|t| t.split_whitespace().next())
            .filter(|w| w.chars().count() > 2)
            .map(str::to_string)
            .unwrap_or_default()
    }
}

// ── Total helpers ─────────────────────────────────────────────────────────────

fn is_total_line(text: &str) -> bool {
    let lower = text.to_lowercase();
    TOTAL_HINTS.iter().any(|h| lower.contains(h)) && !NOT_TOTAL_HINTS.iter().any(|h| lower.contains(h))
}

/// Every amount on the line, left to right, from the first pattern that matches at all.
fn amount_matches(text: &str) -> Vec<(String, f64)> {
    for re in [re_amount_currency(), re_amount_us(), re_amount_eu()] {
        let found: Vec<(String, f64)> = re
            .captures_iter(text)
            .filter_map(|c| {
                let raw = c.get(0)?.as_str().trim().to_string();
                Some((raw, normalize_amount(c.get(1)?.as_str())))
            })
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn keyword_bottommost(lines: &[Line]) -> Option<AmountCandidate> {
    let mut candidates: Vec<AmountCandidate> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_total_line(&line.text))
        .filter_map(|(line_index, line)| {
            // Labels come first, so the value is the last amount on the line.
            let (amount_text, amount) = amount_matches(&line.text).pop()?;
            Some(AmountCandidate {
                line_index,
                vertical_position: line.vertical_position,
                amount_text,
                amount,
                strategy: TotalStrategy::KeywordBottommost,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.vertical_position
            .total_cmp(&b.vertical_position)
            .then(a.amount.total_cmp(&b.amount))
    });
    candidates.pop()
}

fn global_max(lines: &[Line], config: &ExtractionConfig) -> Option<AmountCandidate> {
    let plausible = config.min_plausible_amount..=config.max_plausible_amount;
    let mut best: Option<AmountCandidate> = None;

    for (line_index, line) in lines.iter().enumerate() {
        if re_fallback_noise().is_match(&line.text) {
            continue;
        }
        for (amount_text, amount) in amount_matches(&line.text) {
            if !plausible.contains(&amount) {
                continue;
            }
            // Strict comparison: the first occurrence of the maximum is kept.
            if best.as_ref().map_or(true, |b| amount > b.amount) {
                best = Some(AmountCandidate {
                    line_index,
                    vertical_position: line.vertical_position,
                    amount_text,
                    amount,
                    strategy: TotalStrategy::GlobalMax,
                });
            }
        }
    }
    best
}

// ── Vendor helpers ────────────────────────────────────────────────────────────

/// At least one cased character and no lower-case ones.
fn is_upper_case(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

// ── Date ─────────────────────────────────────────────────────────────────────

/// First date-like substring, verbatim. Patterns are tried from most to least
/// specific; an empty string means nothing matched.
pub fn extract_date(text: &str) -> String {
    [re_date_iso(), re_date_numeric(), re_date_textual()]
        .into_iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Best-effort interpretation of a string returned by [`extract_date`].
/// Numeric dates are read day-first, then month-first.
pub fn parse_receipt_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();

    if let Some(c) = re_date_textual().captures(date) {
        let day: u32 = c.get(1)?.as_str().parse().ok()?;
        let month = abbr_month_to_num(c.get(2)?.as_str())?;
        let year: i32 = c.get(3)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    match prefix.as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
