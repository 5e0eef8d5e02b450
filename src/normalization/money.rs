use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use std::str::FromStr;

/// Whole-unit digits beyond this cannot be a ticket amount and would overflow
/// `i64` cents.
const MAX_INTEGER_DIGITS: i64 = 16;
/// Fractional digits beyond this are rejected before rescaling.
const MAX_SCALE: i64 = 64;

/// Convert an export money string ("1,234.50") into integer minor units.
///
/// Thousands separators are stripped. Empty or unparseable input yields 0 so a
/// single malformed cell never aborts a row. Rounding is half-up with ties
/// away from zero (`12.345` -> `1235`, `-0.005` -> `-1`).
pub fn decimal_to_cents(value: Option<&str>) -> i64 {
    let Some(raw) = value else {
        return 0;
    };
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0;
    }
    let Ok(amount) = BigDecimal::from_str(cleaned) else {
        return 0;
    };
    // Exponent notation ("1e7000000") parses cheaply but rescales expensively.
    let (_, scale) = amount.as_bigint_and_exponent();
    let integer_digits = amount.digits() as i64 - scale;
    if scale > MAX_SCALE || integer_digits > MAX_INTEGER_DIGITS {
        return 0;
    }
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .unwrap_or(0)
}

/// Looser check used by export validation: tolerates a leading currency
/// symbol as well as thousands separators.
pub fn is_valid_amount(value: &str) -> bool {
    let cleaned: String = value.chars().filter(|c| *c != '$' && *c != ',').collect();
    BigDecimal::from_str(cleaned.trim()).is_ok()
}
