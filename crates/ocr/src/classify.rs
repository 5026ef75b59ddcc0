use crate::types::{ReceiptType, ReceiptTypeResult, TypeConfidence};

/// A receipt category and the lowercase substrings that suggest it.
#[derive(Debug)]
struct TypeRule {
    receipt_type: ReceiptType,
    keywords: &'static [&'static str],
}

impl TypeRule {
    fn matches(&self, lowercase_text: &str) -> bool {
        self.keywords.iter().any(|k| lowercase_text.contains(k))
    }
}

// Order here is the order of `all_types`.
const TYPE_RULES: [TypeRule; 8] = [
    TypeRule {
        receipt_type: ReceiptType::Grocery,
        keywords: &[
            "grocery", "groceries", "supermarket", "produce", "dairy", "bakery",
            "whole foods", "kroger", "safeway", "aldi", "trader joe",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Restaurant,
        keywords: &[
            "restaurant", "cafe", "café", "coffee", "pizza", "burger", "diner",
            "bistro", "trattoria", "grill", "gratuity", "dine in", "takeaway",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Fuel,
        keywords: &[
            "fuel", "petrol", "diesel", "unleaded", "gas station", "gallons",
            "litres", "liters", "fuel pump", "shell oil", "chevron", "exxon",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Utilities,
        keywords: &[
            "utility", "utilities", "electricity", "water bill",
            "internet", "broadband", "kwh", "meter reading", "billing period",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Pharmacy,
        keywords: &[
            "pharmacy", "pharmacist", "prescription", "drugstore", "drug store",
            "cvs", "walgreens", "chemist", "tablets", "capsules",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Transportation,
        keywords: &[
            "uber trip", "lyft", "taxi", "cab fare", "transit", "metro", "parking",
            "airline", "boarding pass", "railway", "bus fare", "toll",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Shopping,
        keywords: &[
            "shopping", "department store", "retail", "outlet", "boutique",
            "apparel", "clothing", "fashion", "electronics",
        ],
    },
    TypeRule {
        receipt_type: ReceiptType::Online,
        keywords: &[
            "online", "order number", "order #", "order id", "www.", ".com",
            "shipping", "amazon", "e-commerce", "ebay",
        ],
    },
];

/// Tag a receipt with a coarse category from keyword hits in its text.
///
/// No hits gives `general` with low confidence, exactly one gives that type
/// with high confidence, several give `mixed` with medium confidence.
pub fn classify_receipt(text: &str) -> ReceiptTypeResult {
    let lower = text.to_lowercase();
    let all_types: Vec<ReceiptType> = TYPE_RULES
        .iter()
        .filter(|rule| rule.matches(&lower))
        .map(|rule| rule.receipt_type)
        .collect();

    let (primary, confidence) = match all_types.as_slice() {
        [] => (ReceiptType::General, TypeConfidence::Low),
        [only] => (*only, TypeConfidence::High),
        _ => (ReceiptType::Mixed, TypeConfidence::Medium),
    };

    ReceiptTypeResult { primary, all_types, confidence }
}
