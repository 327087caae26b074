//! Per-field parsers.
//!
//! Each parser takes one raw scraped string and either returns the typed
//! value or a [`FieldError`]. Parsing is pattern based because the catalog
//! markup carries decorative text around the values ("Rating: ⭐ 4.5 / 5",
//! "3 Colors") that drifts between pages.

use crate::constants::{GENDER_PREFIX, MAX_RATING, SIZE_PREFIX};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+\.?[0-9]*").expect("decimal pattern is valid"));
static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("integer pattern is valid"));

/// Why a single field could not be converted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field was not present on the card")]
    Absent,

    #[error("no number found in {0:?}")]
    NoNumber(String),

    #[error("{raw:?} is not a valid number")]
    InvalidNumber { raw: String },

    #[error("{value} is outside the allowed range")]
    OutOfRange { value: f64 },
}

/// Strip `$`, thousands separators and whitespace, then convert to the
/// destination currency with `exchange_rate`.
pub fn parse_price(raw: &str, exchange_rate: f64) -> Result<f64, FieldError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(FieldError::NoNumber(raw.to_string()));
    }

    let amount: f64 = cleaned.parse().map_err(|_| FieldError::InvalidNumber {
        raw: raw.to_string(),
    })?;

    // `f64::from_str` also accepts "inf" and "NaN"
    if !amount.is_finite() {
        return Err(FieldError::InvalidNumber {
            raw: raw.to_string(),
        });
    }
    if amount < 0.0 {
        return Err(FieldError::OutOfRange { value: amount });
    }
    if amount == 0.0 {
        return Ok(0.0);
    }

    let converted = amount * exchange_rate;
    if !converted.is_finite() || converted < 0.0 {
        return Err(FieldError::OutOfRange { value: converted });
    }
    Ok(converted)
}

/// First decimal or integer number in the text, e.g. "Rating: ⭐ 4.5 / 5" -> 4.5.
pub fn parse_rating(raw: &str) -> Result<f64, FieldError> {
    let found = DECIMAL_RE
        .find(raw)
        .ok_or_else(|| FieldError::NoNumber(raw.to_string()))?;

    // A trailing dot ("4." ) still parses as a float
    let value: f64 = found
        .as_str()
        .parse()
        .map_err(|_| FieldError::InvalidNumber {
            raw: raw.to_string(),
        })?;

    if !(0.0..=MAX_RATING).contains(&value) {
        return Err(FieldError::OutOfRange { value });
    }
    Ok(value)
}

/// First run of digits, e.g. "3 Colors" -> 3.
pub fn parse_colors(raw: &str) -> Result<u32, FieldError> {
    let found = INTEGER_RE
        .find(raw)
        .ok_or_else(|| FieldError::NoNumber(raw.to_string()))?;

    found.as_str().parse().map_err(|_| FieldError::InvalidNumber {
        raw: raw.to_string(),
    })
}

pub fn parse_size(raw: &str) -> Result<String, FieldError> {
    Ok(strip_label(raw, SIZE_PREFIX))
}

pub fn parse_gender(raw: &str) -> Result<String, FieldError> {
    Ok(strip_label(raw, GENDER_PREFIX))
}

/// Titles are already plain text.
pub fn parse_title(raw: &str) -> Result<String, FieldError> {
    Ok(raw.to_string())
}

fn strip_label(raw: &str, prefix: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(prefix)
        .or_else(|| raw.strip_prefix(prefix))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}
