//! Weight parsing for free-text weight fields.
//!
//! Catalog weights are stored as free text that may embed a unit
//! (`"2kg"`, `"500 g"`, `"1.5"`). The same parser normalizes both a record's
//! weight and a user's search string to kilograms.

use std::sync::LazyLock;

use regex::Regex;

static KILOGRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*kg").expect("Invalid regex"));

static GRAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g\b").expect("Invalid regex"));

static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*$").expect("Invalid regex"));

/// Parse a weight expression into kilograms.
///
/// Patterns are tried in order:
/// 1. `<number>kg` anywhere in the text
/// 2. `<number>g` anywhere in the text (divided by 1000)
/// 3. a bare number, assumed to already be kilograms
///
/// Returns `None` when none of the patterns match.
///
/// # Examples
///
/// ```
/// use handicraft_core::parse_weight_kg;
///
/// assert_eq!(parse_weight_kg("2kg"), Some(2.0));
/// assert_eq!(parse_weight_kg("500g"), Some(0.5));
/// assert_eq!(parse_weight_kg("3"), Some(3.0));
/// assert_eq!(parse_weight_kg("ganesha"), None);
/// ```
#[must_use]
pub fn parse_weight_kg(text: &str) -> Option<f64> {
    if let Some(kg) = capture_number(&KILOGRAM_RE, text) {
        return Some(kg);
    }
    if let Some(grams) = capture_number(&GRAM_RE, text) {
        return Some(grams / 1000.0);
    }
    capture_number(&BARE_NUMBER_RE, text)
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
