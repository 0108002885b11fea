//! Field normalization for Zencoder payloads.
//!
//! Zencoder reports technical metadata inconsistently: numbers arrive as JSON
//! numbers or as strings ("29.97", "171030.0"), and blank fields arrive as
//! null or as "". Every per-field attribute of an input or output track goes
//! through these helpers, so absence is always `None` — never a zero or an
//! empty-string sentinel.

use serde::Deserialize;

/// A scalar field as transmitted by the provider, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
}

/// Normalize a free-form field (codec names, checksums, identifiers).
///
/// Blank strings collapse to absence. Numeric values are rendered without
/// decorative formatting (no trailing ".0" on integral numbers). All other
/// strings pass through verbatim.
pub fn text(field: Option<&RawField>) -> Option<String> {
    match field {
        None => None,
        Some(RawField::Text(s)) if s.is_empty() => None,
        Some(RawField::Text(s)) => Some(s.clone()),
        Some(RawField::Number(n)) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
        Some(RawField::Number(n)) => Some(n.to_string()),
    }
}

/// Normalize a fractional numeric field (frame rates, percentages),
/// preserving fractional precision of string renderings like "29.97".
pub fn float(field: Option<&RawField>) -> Option<f64> {
    match field {
        None => None,
        Some(RawField::Number(n)) => Some(*n),
        Some(RawField::Text(s)) if s.is_empty() => None,
        Some(RawField::Text(s)) => s.trim().parse().ok(),
    }
}

/// Normalize an integral numeric field (dimensions, durations, bitrates,
/// byte sizes). Zencoder occasionally transmits these as decimal strings
/// ("171030.0"), so they are read as floats and rounded.
pub fn integer(field: Option<&RawField>) -> Option<u64> {
    float(field).and_then(|n| {
        if n >= 0.0 {
            Some(n.round() as u64)
        } else {
            None
        }
    })
}

/// Collapse a blank plain-string field (URL, timestamp, label, error message)
/// to absence. The value itself is never reparsed or reformatted.
pub fn blank_to_none(field: Option<&str>) -> Option<String> {
    match field {
        None => None,
        Some(s) if s.is_empty() => None,
        Some(s) => Some(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> RawField {
        RawField::Number(n)
    }

    fn txt(s: &str) -> RawField {
        RawField::Text(s.to_string())
    }

    #[test]
    fn test_absent_stays_absent() {
        assert_eq!(text(None), None);
        assert_eq!(float(None), None);
        assert_eq!(integer(None), None);
        assert_eq!(blank_to_none(None), None);
    }

    #[test]
    fn test_blank_collapses_to_absent() {
        assert_eq!(text(Some(&txt(""))), None);
        assert_eq!(float(Some(&txt(""))), None);
        assert_eq!(integer(Some(&txt(""))), None);
        assert_eq!(blank_to_none(Some("")), None);
    }

    #[test]
    fn test_numeric_strings_convert_with_precision() {
        assert_eq!(float(Some(&txt("29.97"))), Some(29.97));
        assert_eq!(float(Some(&num(30.0))), Some(30.0));
    }

    #[test]
    fn test_integer_accepts_decimal_renderings() {
        assert_eq!(integer(Some(&txt("57992"))), Some(57992));
        assert_eq!(integer(Some(&txt("171030.0"))), Some(171030));
        assert_eq!(integer(Some(&num(535.0))), Some(535));
    }

    #[test]
    fn test_numeric_ids_render_without_decimal_point() {
        // JSON numbers deserialize into f64; ids must come back out intact.
        assert_eq!(text(Some(&num(166179248.0))), Some("166179248".to_string()));
    }

    #[test]
    fn test_strings_pass_through_verbatim() {
        assert_eq!(text(Some(&txt("aac"))), Some("aac".to_string()));
        assert_eq!(
            blank_to_none(Some("2015-06-09T16:18:26Z")),
            Some("2015-06-09T16:18:26Z".to_string())
        );
    }

    #[test]
    fn test_untagged_deserialization() {
        let from_number: RawField = serde_json::from_str("320").unwrap();
        assert_eq!(integer(Some(&from_number)), Some(320));
        let from_string: RawField = serde_json::from_str("\"29.97\"").unwrap();
        assert_eq!(float(Some(&from_string)), Some(29.97));
    }
}
