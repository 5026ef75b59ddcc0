pub mod money;

pub use money::{normalize_amount, parse_localized_amount, Money};
