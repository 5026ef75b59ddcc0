use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    /// Lossy conversion from an extracted float amount; non-finite input is zero.
    pub fn from_f64(amount: f64) -> Self {
        Decimal::from_f64(amount)
            .map(Money::from_decimal)
            .unwrap_or_else(Money::zero)
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).round().to_i64().unwrap_or(0)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ── Localized amount parsing ──────────────────────────────────────────────────

/// Parse a numeral as printed on a receipt, honoring both grouping conventions.
///
/// When a comma and a period are both present, whichever appears last is the
/// decimal separator (`1,234.56` and `1.234,56` are the same amount). A lone
/// comma style is read as European: the rightmost comma is the decimal point.
/// Period-only or separator-free input is taken as canonical.
///
/// Returns `None` when the result is not a number. Negative values are
/// returned as-is; clamping is the caller's concern.
pub fn parse_localized_amount(raw: &str) -> Option<Decimal> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let canonical = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(period)) if period > comma => compact.replace(',', ""),
        (Some(comma), _) => {
            let (int_part, frac_part) = compact.split_at(comma);
            let int_part: String = int_part.chars().filter(|c| *c != ',' && *c != '.').collect();
            format!("{int_part}.{}", &frac_part[1..])
        }
        (None, _) => compact,
    };

    Decimal::from_str(&canonical).ok()
}

/// Normalize a localized numeral into a non-negative float.
///
/// Unparseable and negative input both yield `0.0`, so callers cannot tell a
/// failed parse from a genuine zero. Use [`parse_localized_amount`] when that
/// distinction matters.
pub fn normalize_amount(raw: &str) -> f64 {
    parse_localized_amount(raw)
        .and_then(|d| d.to_f64())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_grouping() {
        assert_eq!(normalize_amount("1,234.56"), 1234.56);
        assert_eq!(normalize_amount("12,345,678.90"), 12_345_678.90);
    }

    #[test]
    fn european_grouping() {
        assert_eq!(normalize_amount("1.234,56"), 1234.56);
        assert_eq!(normalize_amount("12,50"), 12.50);
    }

    #[test]
    fn canonical_input_is_untouched() {
        assert_eq!(normalize_amount("1234.56"), 1234.56);
        assert_eq!(normalize_amount("42"), 42.0);
        assert_eq!(normalize_amount("0.05"), 0.05);
    }

    #[test]
    fn comma_only_reads_rightmost_as_decimal() {
        assert_eq!(normalize_amount("1,234"), 1.234);
        assert_eq!(normalize_amount("1,234,56"), 1234.56);
    }

    #[test]
    fn space_grouped_thousands() {
        assert_eq!(normalize_amount("1 234.56"), 1234.56);
    }

    #[test]
    fn malformed_input_is_zero() {
        assert_eq!(normalize_amount(""), 0.0);
        assert_eq!(normalize_amount("abc"), 0.0);
        assert_eq!(normalize_amount("1.2.3"), 0.0);
        assert_eq!(normalize_amount("12.3x"), 0.0);
    }

    #[test]
    fn negative_is_zero() {
        assert_eq!(normalize_amount("-5.00"), 0.0);
        assert_eq!(parse_localized_amount("-5.00"), Some(Decimal::new(-500, 2)));
    }

    #[test]
    fn parse_reports_failure() {
        assert_eq!(parse_localized_amount("0.00"), Some(Decimal::ZERO));
        assert!(parse_localized_amount("n/a").is_none());
    }

    #[test]
    fn money_display_and_cents() {
        let m = Money::from_f64(110.0);
        assert_eq!(m.to_string(), "110.00");
        assert_eq!(m.to_cents(), 11000);
        assert_eq!(Money::from_cents(550).to_string(), "5.50");
        assert!(Money::from_f64(f64::NAN).is_zero());
    }
}
