use crate::error::{EngineError, Result};

/// Decimal places kept for scene times.
pub const SECONDS_DECIMALS: i32 = 2;
/// Decimal places kept for crop percentages.
pub const PERCENT_DECIMALS: i32 = 1;

/// Rounds seconds to two decimals.
///
/// # Example
/// ```
/// use engine::time::round_seconds;
///
/// assert_eq!(round_seconds(5.004), 5.0);
/// assert_eq!(round_seconds(0.1 + 0.2), 0.3);
/// ```
pub fn round_seconds(value: f64) -> f64 {
    round_decimals(value, SECONDS_DECIMALS)
}

/// Rounds a percentage to one decimal.
pub fn round_percent(value: f64) -> f64 {
    round_decimals(value, PERCENT_DECIMALS)
}

/// Validates a non-negative, finite time value and rounds it.
pub fn seconds_field(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(round_seconds(value))
}

/// Validates a crop percentage in `0..=100` and rounds it.
pub fn percent_field(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(EngineError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(round_percent(value))
}

/// Parses user-entered text for a numeric field.
///
/// # Example
/// ```
/// use engine::time::parse_number;
///
/// assert_eq!(parse_number("start", " 12.5 ").expect("valid"), 12.5);
/// assert!(parse_number("start", "abc").is_err());
/// ```
pub fn parse_number(field: &'static str, input: &str) -> Result<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| EngineError::InvalidField {
            field,
            value: input.to_string(),
        })
}

fn round_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}
