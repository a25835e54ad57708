/// Formats seconds with exactly two decimals, as used by `trim`/`atrim`.
///
/// # Example
/// ```
/// use media_ffmpeg::format_seconds;
///
/// assert_eq!(format_seconds(5.0), "5.00");
/// assert_eq!(format_seconds(12.345), "12.35");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    normalize_negative_zero(format!("{seconds:.2}"))
}

/// Formats a value with at most two decimals and no trailing zeros.
///
/// # Example
/// ```
/// use media_ffmpeg::format_decimal;
///
/// assert_eq!(format_decimal(607.5), "607.5");
/// assert_eq!(format_decimal(1080.0), "1080");
/// assert_eq!(format_decimal(656.251), "656.25");
/// ```
pub fn format_decimal(value: f64) -> String {
    let text = format!("{value:.2}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    normalize_negative_zero(trimmed.to_string())
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
///
/// # Example
/// ```
/// use media_ffmpeg::sanitize_file_stem;
///
/// assert_eq!(sanitize_file_stem("My clip #1"), "My_clip__1");
/// ```
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Quotes `value` for a POSIX shell using single quotes.
///
/// # Example
/// ```
/// use media_ffmpeg::shell_quote;
///
/// assert_eq!(shell_quote("in put.mp4"), "'in put.mp4'");
/// assert_eq!(shell_quote("it's.mp4"), r"'it'\''s.mp4'");
/// ```
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn normalize_negative_zero(text: String) -> String {
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|ch| ch == '0' || ch == '.') => rest.to_string(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::{format_decimal, format_seconds, sanitize_file_stem};

    #[test]
    fn format_decimal_drops_negative_sign_on_zero() {
        assert_eq!(format_decimal(-0.001), "0");
        assert_eq!(format_seconds(-0.001), "0.00");
    }

    #[test]
    fn format_decimal_keeps_integer_zeros() {
        assert_eq!(format_decimal(100.0), "100");
        assert_eq!(format_decimal(0.0), "0");
        assert_eq!(format_decimal(12.10), "12.1");
    }

    #[test]
    fn sanitize_file_stem_replaces_non_ascii_characters() {
        assert_eq!(sanitize_file_stem("café/intro"), "caf__intro");
        assert_eq!(sanitize_file_stem("ok_name-2"), "ok_name-2");
    }
}
