//! Rug dimension parsing, formatting and footage calculations
//!
//! Rug edges are entered either in `ft_in` notation (`F.II`: integer feet,
//! then a two-digit inches code) or as plain decimal feet. Everything
//! downstream works in mathematical feet.
//!
//! Parsing never fails. Malformed measurements degrade toward `0` and
//! out-of-range inches are clamped, so data entry is never blocked.
//!
//! # Examples
//!
//! ```
//! use rugdesk_common::dimensions::{format_dimension, parse_dimension, DimensionFormat};
//!
//! assert_eq!(parse_dimension("9.06", DimensionFormat::FtIn), 9.5);
//! assert_eq!(format_dimension(9.5, DimensionFormat::FtIn), "9.06");
//! assert_eq!(format_dimension(9.5, DimensionFormat::DecimalFt), "9.50");
//! ```

use serde::{Deserialize, Serialize};

use crate::edges::EdgeTag;

const INCHES_PER_FOOT: f64 = 12.0;

/// Largest inches code accepted; larger codes clamp here (no carry).
const MAX_INCHES: u64 = 11;

/// External notation of a dimension value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionFormat {
    /// `F.II` feet and two-digit inches (industry notation)
    #[default]
    FtIn,
    /// Plain decimal feet
    DecimalFt,
}

/// Raw measurement as captured from a form or an API payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionInput {
    Number(f64),
    Text(String),
}

impl DimensionInput {
    /// Convert to mathematical feet.
    ///
    /// Numbers go through their shortest decimal rendering, so `9.06` in
    /// `ft_in` notation still means 9 feet 6 inches.
    pub fn to_feet(&self, format: DimensionFormat) -> f64 {
        match self {
            DimensionInput::Text(text) => parse_dimension(text, format),
            DimensionInput::Number(value) => parse_dimension(&value.to_string(), format),
        }
    }
}

impl From<&str> for DimensionInput {
    fn from(value: &str) -> Self {
        DimensionInput::Text(value.to_string())
    }
}

impl From<String> for DimensionInput {
    fn from(value: String) -> Self {
        DimensionInput::Text(value)
    }
}

impl From<f64> for DimensionInput {
    fn from(value: f64) -> Self {
        DimensionInput::Number(value)
    }
}

/// Length and width of a rug in mathematical feet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RugDimensions {
    #[serde(alias = "lengthFt")]
    pub length_ft: f64,
    #[serde(alias = "widthFt")]
    pub width_ft: f64,
}

impl RugDimensions {
    pub fn new(length_ft: f64, width_ft: f64) -> Self {
        Self { length_ft, width_ft }
    }

    /// Build dimensions from two raw measurements in the same notation
    pub fn parse(length: &str, width: &str, format: DimensionFormat) -> Self {
        Self {
            length_ft: parse_dimension(length, format),
            width_ft: parse_dimension(width, format),
        }
    }
}

/// Billing footage for one rug and one edge selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootageSummary {
    pub linear_ft: f64,
    pub square_ft: f64,
}

/// Parse a measurement into mathematical feet.
///
/// - Empty input, the literal `"0"` and negative input yield `0`.
/// - `decimal_ft`: leading decimal number (`"9.5ft"` is 9.5); no leading
///   digits yields `0`.
/// - `ft_in`: split on the first `.`. The integer part is feet. A
///   single-digit inches code is zero-padded (`"9.6"` is 9 ft 6 in, not
///   9 ft 60 in). Inches are clamped to `[0, 11]` and never carried into
///   feet.
///
/// Integer parts use leading-digit semantics: `"9abc"` is 9, `"abc"` is 0.
pub fn parse_dimension(raw: &str, format: DimensionFormat) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0" || raw.starts_with('-') {
        return 0.0;
    }

    match format {
        DimensionFormat::DecimalFt => match leading_decimal(raw) {
            Some(value) if value.is_finite() && value > 0.0 => value,
            _ => 0.0,
        },
        DimensionFormat::FtIn => parse_ft_in(raw),
    }
}

fn parse_ft_in(raw: &str) -> f64 {
    let (feet_part, inches_code) = match raw.split_once('.') {
        Some((feet, inches)) => (feet, inches),
        None => (raw, ""),
    };

    let feet = leading_integer(feet_part).unwrap_or(0) as f64;
    if inches_code.is_empty() {
        return feet;
    }

    let inches = if inches_code.chars().count() == 1 {
        leading_integer(&format!("0{inches_code}"))
    } else {
        leading_integer(inches_code)
    }
    .unwrap_or(0)
    .min(MAX_INCHES);

    feet + inches as f64 / INCHES_PER_FOOT
}

/// Leading unsigned integer of `text`, ignoring anything after the digits
fn leading_integer(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Leading unsigned decimal of `text` (`digits[.digits]`), ignoring the rest
fn leading_decimal(text: &str) -> Option<f64> {
    let text = text.strip_prefix('+').unwrap_or(text);
    let int_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());

    let mut end = int_end;
    if let Some(fraction) = text[int_end..].strip_prefix('.') {
        let frac_len = fraction
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(fraction.len());
        if frac_len > 0 {
            end = int_end + 1 + frac_len;
        }
    }

    if int_end == 0 && end == 0 {
        return None;
    }
    text[..end].parse().ok()
}

/// Split feet into whole feet and rounded inches.
///
/// Rounding that lands on 12 inches carries into the next foot, so the
/// result always fits the `[0, 11]` range that [`parse_dimension`] accepts.
pub fn split_feet_inches(feet: f64) -> (u64, u8) {
    let feet = sanitize_feet(feet);
    let whole = feet.floor();
    let inches = ((feet - whole) * INCHES_PER_FOOT).round() as u8;
    let whole = whole as u64;

    if inches >= 12 {
        (whole + 1, 0)
    } else {
        (whole, inches)
    }
}

/// Format mathematical feet in the requested notation.
///
/// Non-finite or negative values are formatted as zero.
pub fn format_dimension(feet: f64, format: DimensionFormat) -> String {
    match format {
        DimensionFormat::DecimalFt => format!("{:.2}", sanitize_feet(feet)),
        DimensionFormat::FtIn => {
            let (whole, inches) = split_feet_inches(feet);
            format!("{}.{:02}", whole, inches)
        }
    }
}

fn sanitize_feet(feet: f64) -> f64 {
    if feet.is_finite() && feet > 0.0 {
        feet
    } else {
        0.0
    }
}

/// Sum of the selected edge lengths.
///
/// Ends add the width, sides add the length. This is a plain fold: a
/// repeated tag is counted again.
pub fn calculate_linear_feet(dimensions: &RugDimensions, selected_edges: &[EdgeTag]) -> f64 {
    selected_edges
        .iter()
        .map(|edge| edge.length_on(dimensions))
        .sum()
}

/// Rug area in square feet, unrounded
pub fn calculate_square_feet(dimensions: &RugDimensions) -> f64 {
    dimensions.length_ft * dimensions.width_ft
}

/// Linear and square footage in one pass
pub fn calculate_footage(dimensions: &RugDimensions, selected_edges: &[EdgeTag]) -> FootageSummary {
    FootageSummary {
        linear_ft: calculate_linear_feet(dimensions, selected_edges),
        square_ft: calculate_square_feet(dimensions),
    }
}
