// Canonical forms for the loosely typed values found in GeoJSON property bags
// and in the structure catalog.

use serde_json::Value;

/// Canonicalize any catalog or property value into a non-empty trimmed string.
///
/// `null` (and a missing value) is absent. Strings are trimmed. Numbers and
/// booleans use their textual form, integral floats without a trailing `.0` so
/// that `1234` and `1234.0` index to the same key. Arrays and objects use their
/// compact JSON text. An empty result after trimming is absent.
pub fn normalize_id(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => return normalize_str(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    };
    normalize_str(&text)
}

/// Trim a string, treating an empty result as absent.
pub fn normalize_str(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Read a finite number from a native JSON number or a numeric string.
///
/// Strings are trimmed before parsing; empty strings, `NaN` and infinities are
/// rejected. Booleans, arrays and objects never coerce.
pub fn to_finite_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_blank_values_normalize_to_none() {
        assert_eq!(normalize_id(None), None);
        assert_eq!(normalize_id(Some(&Value::Null)), None);
        assert_eq!(normalize_id(Some(&json!(""))), None);
        assert_eq!(normalize_id(Some(&json!("   \t"))), None);
    }

    #[test]
    fn strings_are_trimmed() {
        assert_eq!(normalize_id(Some(&json!("  WP-001 "))), Some("WP-001".to_string()));
    }

    #[test]
    fn numbers_and_booleans_use_text_form() {
        assert_eq!(normalize_id(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(normalize_id(Some(&json!(42.0))), Some("42".to_string()));
        assert_eq!(normalize_id(Some(&json!(4.25))), Some("4.25".to_string()));
        assert_eq!(normalize_id(Some(&json!(true))), Some("true".to_string()));
    }

    #[test]
    fn numeric_strings_parse_after_trimming() {
        assert_eq!(to_finite_number(Some(&json!(" 750 "))), Some(750.0));
        assert_eq!(to_finite_number(Some(&json!(1200))), Some(1200.0));
        assert_eq!(to_finite_number(Some(&json!("1e3"))), Some(1000.0));
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert_eq!(to_finite_number(None), None);
        assert_eq!(to_finite_number(Some(&Value::Null)), None);
        assert_eq!(to_finite_number(Some(&json!(""))), None);
        assert_eq!(to_finite_number(Some(&json!("abc"))), None);
        assert_eq!(to_finite_number(Some(&json!("NaN"))), None);
        assert_eq!(to_finite_number(Some(&json!("inf"))), None);
        assert_eq!(to_finite_number(Some(&json!(true))), None);
        assert_eq!(to_finite_number(Some(&json!([500]))), None);
        assert_eq!(to_finite_number(Some(&json!({"mm": 500}))), None);
    }
}
