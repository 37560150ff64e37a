//! Normalization of raw EXIF value strings into display values.
//!
//! EXIF stores exposure time and f-number as rationals (`"1/250"`,
//! `"28/10"`). Backends hand those over in their raw textual form and the
//! functions here turn them into what a record stores:
//!
//! | Tag | Raw | Stored |
//! |-----|-----|--------|
//! | FNumber | `"28/10"` | `2.8` |
//! | ExposureTime | `"1/250"` | `"1/250"` |
//! | ExposureTime | `"5/2"` | `"2.5"` |
//! | ExposureTime | `"1/0"` | `"Invalid"` |
//!
//! Malformed input never fails: it degrades to a safe default (`0.0` or
//! [`INVALID_SHUTTER_SPEED`]) and logs a warning.

use tracing::warn;

/// Stored in place of a shutter speed that cannot be parsed.
pub const INVALID_SHUTTER_SPEED: &str = "Invalid";

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse `"N/D"` or a plain number into a decimal.
///
/// - `"N/D"`: the quotient rounded to two decimals; `0.0` with a warning when
///   `D` is zero, either side is not a number, or the quotient is not finite.
/// - plain finite number: returned as parsed.
/// - anything else: `0.0` with a warning.
pub fn parse_rational_to_decimal(raw: &str) -> f64 {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('/').collect();

    if parts.len() == 2 {
        let (Ok(num), Ok(denom)) = (
            parts[0].trim().parse::<f64>(),
            parts[1].trim().parse::<f64>(),
        ) else {
            warn!(value = raw, "rational has a non-numeric part");
            return 0.0;
        };
        if denom == 0.0 {
            warn!(value = raw, "rational has a zero denominator");
            return 0.0;
        }
        let quotient = round2(num / denom);
        if !quotient.is_finite() {
            warn!(value = raw, "rational is not a finite number");
            return 0.0;
        }
        return quotient;
    }

    if parts.len() == 1
        && let Ok(value) = raw.parse::<f64>()
    {
        if value.is_finite() {
            return value;
        }
        warn!(value = raw, "rational is not a finite number");
        return 0.0;
    }

    warn!(value = raw, "unrecognized rational value");
    0.0
}

/// Render an exposure time for display.
///
/// Fractions below one second keep their `"N/D"` text (`"1/250"`). One
/// second and longer become decimal seconds: `"4/1"` → `"4"`, `"5/2"` →
/// `"2.5"`. An unparseable fraction or zero denominator becomes
/// [`INVALID_SHUTTER_SPEED`]. Values without `/` pass through unchanged.
pub fn normalize_shutter_speed(raw: &str) -> String {
    let Some((num_text, denom_text)) = raw.split_once('/') else {
        return raw.to_string();
    };

    let parsed = (
        num_text.trim().parse::<f64>(),
        denom_text.trim().parse::<f64>(),
    );
    let (num, denom) = match parsed {
        (Ok(num), Ok(denom)) if denom != 0.0 && (num / denom).is_finite() => (num, denom),
        _ => {
            warn!(value = raw, "unparseable shutter speed");
            return INVALID_SHUTTER_SPEED.to_string();
        }
    };

    if num < denom {
        return format!("{}/{}", num_text.trim(), denom_text.trim());
    }

    let seconds = num / denom;
    if seconds.fract() == 0.0 {
        format!("{}", seconds as i64)
    } else {
        let text = format!("{:.2}", seconds);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// First value of a possibly comma-joined integer field, trimmed.
///
/// Returns `None` for blank input.
pub fn normalize_iso(raw: &str) -> Option<String> {
    raw.split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
