//! Field extraction from text captured on listing detail pages.
//!
//! Every function here is total over string input: text that does not match
//! yields `None` ("not found"), never an error. The patterns target the
//! single locale the site is scraped in (Spanish labels, `S/` currency).

use std::sync::LazyLock;

use regex::Regex;

/// Currency marker followed by the integer part of the price.
/// Decimals and thousands separators are not parsed.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"S/\s*(\d+)").expect("valid price regex"));

/// Decimal rating after the `"de "` marker, e.g. `"Calificación de 4.85 de 5"`.
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"de (\d+\.\d+)").expect("valid rating regex"));

/// Digits before the singular or plural unit word.
static REVIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*reseñas?").expect("valid review regex"));

/// Extracts the integer price following the `S/` currency marker.
///
/// Returns `None` when there is no marker, the marker has no trailing
/// digits, or the digits overflow a `u64`.
#[must_use]
pub fn extract_price(text: &str) -> Option<u64> {
    PRICE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Extracts the decimal rating embedded in a rating label, verbatim.
///
/// Returns `None` for an empty label or a label without a `de <n.n>` match.
#[must_use]
pub fn extract_rating(raw_label: &str) -> Option<String> {
    if raw_label.is_empty() {
        return None;
    }
    RATING_RE
        .captures(raw_label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Extracts the review count preceding `reseña`/`reseñas` (case-insensitive).
///
/// Returns `None` for an empty label or a label without a match.
#[must_use]
pub fn extract_review_count(raw_label: &str) -> Option<String> {
    if raw_label.is_empty() {
        return None;
    }
    REVIEW_RE
        .captures(raw_label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Picks the rating text: shape A when it starts with `label_prefix`,
/// otherwise shape B (which may be empty).
#[must_use]
pub fn choose_rating_source<'a>(shape_a: &'a str, shape_b: &'a str, label_prefix: &str) -> &'a str {
    if shape_a.starts_with(label_prefix) {
        shape_a
    } else {
        shape_b
    }
}

/// Picks the review text: shape A when it contains `marker` (case-sensitive),
/// otherwise shape B.
#[must_use]
pub fn choose_review_source<'a>(shape_a: &'a str, shape_b: &'a str, marker: &str) -> &'a str {
    if shape_a.contains(marker) {
        shape_a
    } else {
        shape_b
    }
}

/// Turns an entry locator into an absolute address, prepending `https://`
/// when no scheme is present.
#[must_use]
pub fn absolute_url(locator: &str) -> String {
    let locator = locator.trim();
    if locator.starts_with("http://") || locator.starts_with("https://") {
        locator.to_owned()
    } else if let Some(rest) = locator.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https://{locator}")
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
