//! Price helpers using decimal arithmetic.
//!
//! Catalog prices are Indian rupees stored as `Decimal`. Display formatting
//! follows the `en-IN` convention: the last three integer digits are grouped
//! together and every earlier group has two digits (`₹12,34,567`).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol prefixed to formatted prices.
pub const RUPEE_SYMBOL: &str = "₹";

/// Format a price as rupees with Indian digit grouping.
///
/// Fractions are rounded to two places and trailing zeros are dropped, so
/// whole amounts render without decimals.
///
/// # Examples
///
/// ```
/// use handicraft_core::format_inr;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_inr(Decimal::new(1234567, 0)), "₹12,34,567");
/// assert_eq!(format_inr(Decimal::new(9995, 1)), "₹999.5");
/// ```
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (integer, fraction) = text.split_once('.').map_or((text.as_str(), None), |(i, f)| (i, Some(f)));

    let mut formatted = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        formatted.push('-');
    }
    formatted.push_str(RUPEE_SYMBOL);
    formatted.push_str(&group_indian(integer));
    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        if let Some(group) = head.get(start..end) {
            groups.push(group);
        }
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Percentage saved by a discounted price, rounded to a whole number.
///
/// Returns 0 when either price is missing/non-positive or when the
/// "discount" is not actually lower than the original.
#[must_use]
pub fn discount_percentage(original: Decimal, discounted: Decimal) -> u32 {
    if original <= Decimal::ZERO || discounted <= Decimal::ZERO {
        return 0;
    }
    let percentage = ((original - discounted) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if percentage > Decimal::ZERO {
        percentage.to_u32().unwrap_or(0)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(format_inr(Decimal::ZERO), "₹0");
        assert_eq!(format_inr(Decimal::new(999, 0)), "₹999");
    }

    #[test]
    fn test_format_indian_grouping() {
        assert_eq!(format_inr(Decimal::new(1000, 0)), "₹1,000");
        assert_eq!(format_inr(Decimal::new(25000, 0)), "₹25,000");
        assert_eq!(format_inr(Decimal::new(123_456, 0)), "₹1,23,456");
        assert_eq!(format_inr(Decimal::new(12_345_678, 0)), "₹1,23,45,678");
    }

    #[test]
    fn test_format_fraction_digits() {
        assert_eq!(format_inr(Decimal::new(150_050, 2)), "₹1,500.5");
        assert_eq!(format_inr(Decimal::new(150_000, 2)), "₹1,500");
        assert_eq!(format_inr(Decimal::new(12_345, 3)), "₹12.35");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_inr(Decimal::new(-1500, 0)), "-₹1,500");
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(Decimal::new(1000, 0), Decimal::new(750, 0)), 25);
        assert_eq!(discount_percentage(Decimal::new(3, 0), Decimal::new(2, 0)), 33);
    }

    #[test]
    fn test_discount_percentage_invalid_inputs() {
        assert_eq!(discount_percentage(Decimal::ZERO, Decimal::new(5, 0)), 0);
        assert_eq!(discount_percentage(Decimal::new(100, 0), Decimal::ZERO), 0);
        assert_eq!(discount_percentage(Decimal::new(100, 0), Decimal::new(120, 0)), 0);
    }
}
