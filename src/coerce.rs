//! Conversions between raw textual values and canonical typed values.
//!
//! Text-only formats (INI, XML) carry every scalar as a string. Loading
//! passes those strings through [`to_typed`] so that `"true"` becomes a
//! boolean and `"15"` an integer, and saving goes back through
//! [`to_text`]. Natively typed formats (JSON, YAML, TOML) skip this pass.

use serde_json::Value as Raw;

use crate::config::Value;

/// Convert a raw string into its canonical typed value.
///
/// `"true"` / `"false"` (any case) become booleans, strings matching the
/// numeric-literal grammar become integers or floats, everything else
/// stays a string.
pub fn to_typed(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }

    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if is_numeric(raw) {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }

        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::Str(raw.to_string())
}

/// Render a typed value as text.
///
/// Booleans render as the literal words `true` / `false`; numbers and
/// strings use their natural representation. A subtree renders as its
/// compact JSON encoding, which is opaque and lossy.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Tree(tree) => tree.to_value().to_string(),
    }
}

/// Recursively apply [`to_typed`] to every string leaf of a raw mapping.
pub fn convert_strings(raw: Raw) -> Raw {
    match raw {
        Raw::String(s) => typed_raw(&s),
        Raw::Array(items) => Raw::Array(items.into_iter().map(convert_strings).collect()),
        Raw::Object(map) => Raw::Object(
            map.into_iter()
                .map(|(key, value)| (key, convert_strings(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Render a raw scalar as text, applying the same rules as [`to_text`].
pub(crate) fn raw_text(raw: &Raw) -> String {
    match raw {
        Raw::Bool(true) => "true".to_string(),
        Raw::Bool(false) => "false".to_string(),
        Raw::Number(n) => n.to_string(),
        Raw::String(s) => s.clone(),
        Raw::Null => String::new(),
        other => other.to_string(),
    }
}

fn typed_raw(s: &str) -> Raw {
    match to_typed(s) {
        Value::Bool(b) => Raw::Bool(b),
        Value::Int(i) => Raw::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Raw::Number)
            .unwrap_or_else(|| Raw::String(s.to_string())),
        _ => Raw::String(s.to_string()),
    }
}

/// Check a string against the numeric-literal grammar.
///
/// Accepts an optional sign, digits with at most one decimal point, and
/// an optional exponent. Rejects the textual float forms (`inf`, `NaN`)
/// that `f64::from_str` would otherwise accept.
fn is_numeric(s: &str) -> bool {
    let mut chars = s.chars().peekable();

    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }

    let mut digits = 0;
    let mut seen_dot = false;

    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' => {
                digits += 1;
                chars.next();
            }
            '.' if !seen_dot => {
                seen_dot = true;
                chars.next();
            }
            _ => break,
        }
    }

    if digits == 0 {
        return false;
    }

    if matches!(chars.peek(), Some('e') | Some('E')) {
        chars.next();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            chars.next();
        }

        let mut exp_digits = 0;
        while matches!(chars.peek(), Some('0'..='9')) {
            exp_digits += 1;
            chars.next();
        }

        if exp_digits == 0 {
            return false;
        }
    }

    chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_any_case() {
        assert_eq!(to_typed("true"), Value::Bool(true));
        assert_eq!(to_typed("TRUE"), Value::Bool(true));
        assert_eq!(to_typed("False"), Value::Bool(false));
        assert_eq!(to_typed("FALSE"), Value::Bool(false));
    }

    #[test]
    fn numbers() {
        assert_eq!(to_typed("15"), Value::Int(15));
        assert_eq!(to_typed("-3"), Value::Int(-3));
        assert_eq!(to_typed("0.75"), Value::Float(0.75));
        assert_eq!(to_typed("1e3"), Value::Float(1000.0));
        assert_eq!(to_typed("-2.5e-1"), Value::Float(-0.25));
    }

    #[test]
    fn non_numeric_strings_survive() {
        assert_eq!(to_typed("foo"), Value::Str("foo".to_string()));
        assert_eq!(to_typed("inf"), Value::Str("inf".to_string()));
        assert_eq!(to_typed("NaN"), Value::Str("NaN".to_string()));
        assert_eq!(to_typed("0x10"), Value::Str("0x10".to_string()));
        assert_eq!(to_typed("1.2.3"), Value::Str("1.2.3".to_string()));
        assert_eq!(to_typed(""), Value::Str(String::new()));
    }

    #[test]
    fn text_rendering() {
        assert_eq!(to_text(&Value::Bool(true)), "true");
        assert_eq!(to_text(&Value::Bool(false)), "false");
        assert_eq!(to_text(&Value::Int(15)), "15");
        assert_eq!(to_text(&Value::Float(0.75)), "0.75");
        assert_eq!(to_text(&Value::Str("foo".to_string())), "foo");
    }

    #[test]
    fn convert_strings_recurses() {
        let raw = serde_json::json!({
            "a": "15",
            "b": { "c": "true", "d": "foo" },
            "e": ["0.5", "x"],
        });
        let converted = convert_strings(raw);
        assert_eq!(
            converted,
            serde_json::json!({
                "a": 15,
                "b": { "c": true, "d": "foo" },
                "e": [0.5, "x"],
            })
        );
    }
}
