//! Field-level parsing for inbound wire records. Every helper records its
//! failures into a shared [`FieldErrors`] so one response reports all of them.

use crate::error::FieldErrors;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";

/// Name of a JSON value's type, as reported in error messages.
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Fetch a field, reporting absence (when required) and explicit null.
fn present<'a>(
    body: &'a Map<String, Value>,
    key: &str,
    path: &str,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<&'a Value> {
    match body.get(key) {
        None => {
            if required {
                errors.add(path, REQUIRED);
            }
            None
        }
        Some(Value::Null) => {
            errors.add(path, NULL);
            None
        }
        Some(v) => Some(v),
    }
}

/// Trimmed, non-blank string of at most `max_length` characters.
/// Numbers are accepted and converted to their decimal text.
pub fn char_field(
    body: &Map<String, Value>,
    key: &str,
    path: &str,
    max_length: usize,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<String> {
    let v = present(body, key, path, required, errors)?;
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(path, NOT_A_STRING);
            return None;
        }
    };
    if s.is_empty() {
        errors.add(path, BLANK);
        return None;
    }
    if s.chars().count() > max_length {
        errors.add(
            path,
            format!("Ensure this field has no more than {} characters.", max_length),
        );
        return None;
    }
    Some(s)
}

fn parse_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Integer from a JSON number without fraction or a numeric string.
pub fn integer_field(
    body: &Map<String, Value>,
    key: &str,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<i32> {
    let v = present(body, key, key, required, errors)?;
    match parse_integer(v).and_then(|n| i32::try_from(n).ok()) {
        Some(n) => Some(n),
        None => {
            errors.add(key, INVALID_INTEGER);
            None
        }
    }
}

/// Integer constrained to `range`; out-of-range values are field errors.
pub fn bounded_integer_field(
    body: &Map<String, Value>,
    key: &str,
    range: RangeInclusive<i32>,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<i32> {
    let n = integer_field(body, key, required, errors)?;
    if n < *range.start() {
        errors.add(key, format!("Ensure this value is greater than or equal to {}.", range.start()));
        return None;
    }
    if n > *range.end() {
        errors.add(key, format!("Ensure this value is less than or equal to {}.", range.end()));
        return None;
    }
    Some(n)
}

/// Value from a closed choice set, parsed with the type's `FromStr`.
pub fn choice_field<T: FromStr>(
    body: &Map<String, Value>,
    key: &str,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<T> {
    let v = present(body, key, key, required, errors)?;
    let raw = match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match raw.parse::<T>() {
        Ok(choice) => Some(choice),
        Err(_) => {
            errors.add(key, format!("\"{}\" is not a valid choice.", raw));
            None
        }
    }
}

/// Primary key of a related row. Existence is checked by the caller.
pub fn primary_key_field(
    body: &Map<String, Value>,
    key: &str,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<i64> {
    let v = present(body, key, key, required, errors)?;
    match v {
        Value::Number(_) | Value::String(_) => match parse_integer(v) {
            Some(pk) => Some(pk),
            None => {
                errors.add(key, format!("Invalid pk \"{}\" - object does not exist.", display_raw(v)));
                None
            }
        },
        other => {
            errors.add(
                key,
                format!("Incorrect type. Expected pk value, received {}.", type_name(other)),
            );
            None
        }
    }
}

pub fn missing_related(pk: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", pk)
}

fn display_raw(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatColor;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn char_field_rules() {
        let body = obj(json!({ "a": "  Tom ", "b": "", "c": 7, "d": [1], "e": null, "f": "abcdefghijklmnopq" }));
        let mut errors = FieldErrors::new();
        assert_eq!(char_field(&body, "a", "a", 16, true, &mut errors).as_deref(), Some("Tom"));
        assert_eq!(char_field(&body, "c", "c", 16, true, &mut errors).as_deref(), Some("7"));
        assert!(errors.is_empty());
        assert!(char_field(&body, "b", "b", 16, true, &mut errors).is_none());
        assert!(char_field(&body, "d", "d", 16, true, &mut errors).is_none());
        assert!(char_field(&body, "e", "e", 16, true, &mut errors).is_none());
        assert!(char_field(&body, "f", "f", 16, true, &mut errors).is_none());
        assert!(char_field(&body, "missing", "missing", 16, false, &mut errors).is_none());
        assert_eq!(errors.get("b"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("d"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(errors.get("e"), Some(&[NULL.to_string()][..]));
        assert_eq!(
            errors.get("f"),
            Some(&["Ensure this field has no more than 16 characters.".to_string()][..])
        );
        assert!(!errors.contains("missing"));
    }

    #[test]
    fn integer_field_accepts_integral_numbers_and_strings() {
        let body = obj(json!({ "a": 2020, "b": "2019", "c": 2018.0, "d": 1.5, "e": "x" }));
        let mut errors = FieldErrors::new();
        assert_eq!(integer_field(&body, "a", true, &mut errors), Some(2020));
        assert_eq!(integer_field(&body, "b", true, &mut errors), Some(2019));
        assert_eq!(integer_field(&body, "c", true, &mut errors), Some(2018));
        assert!(errors.is_empty());
        assert_eq!(integer_field(&body, "d", true, &mut errors), None);
        assert_eq!(integer_field(&body, "e", true, &mut errors), None);
        assert_eq!(integer_field(&body, "z", true, &mut errors), None);
        assert_eq!(errors.get("z"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.contains("d") && errors.contains("e"));
    }

    #[test]
    fn bounded_integer_field_rejects_out_of_range() {
        let body = obj(json!({ "ok": 2020, "low": -2147483648i64, "high": 10000, "bad": "x" }));
        let mut errors = FieldErrors::new();
        assert_eq!(bounded_integer_field(&body, "ok", 1..=9999, true, &mut errors), Some(2020));
        assert!(errors.is_empty());
        assert_eq!(bounded_integer_field(&body, "low", 1..=9999, true, &mut errors), None);
        assert_eq!(bounded_integer_field(&body, "high", 1..=9999, true, &mut errors), None);
        assert_eq!(bounded_integer_field(&body, "bad", 1..=9999, true, &mut errors), None);
        assert_eq!(
            errors.get("low"),
            Some(&["Ensure this value is greater than or equal to 1.".to_string()][..])
        );
        assert_eq!(
            errors.get("high"),
            Some(&["Ensure this value is less than or equal to 9999.".to_string()][..])
        );
        assert_eq!(errors.get("bad"), Some(&[INVALID_INTEGER.to_string()][..]));
    }

    #[test]
    fn choice_field_reports_input() {
        let body = obj(json!({ "ok": "black", "bad": "ultraviolet", "num": 3 }));
        let mut errors = FieldErrors::new();
        assert_eq!(choice_field::<CatColor>(&body, "ok", true, &mut errors), Some(CatColor::Black));
        assert_eq!(choice_field::<CatColor>(&body, "bad", true, &mut errors), None);
        assert_eq!(choice_field::<CatColor>(&body, "num", true, &mut errors), None);
        assert_eq!(
            errors.get("bad"),
            Some(&["\"ultraviolet\" is not a valid choice.".to_string()][..])
        );
        assert_eq!(errors.get("num"), Some(&["\"3\" is not a valid choice.".to_string()][..]));
    }

    #[test]
    fn primary_key_field_types() {
        let body = obj(json!({ "a": 4, "b": "5", "c": true, "d": "five" }));
        let mut errors = FieldErrors::new();
        assert_eq!(primary_key_field(&body, "a", true, &mut errors), Some(4));
        assert_eq!(primary_key_field(&body, "b", true, &mut errors), Some(5));
        assert_eq!(primary_key_field(&body, "c", true, &mut errors), None);
        assert_eq!(primary_key_field(&body, "d", true, &mut errors), None);
        assert_eq!(
            errors.get("c"),
            Some(&["Incorrect type. Expected pk value, received bool.".to_string()][..])
        );
        assert_eq!(
            errors.get("d"),
            Some(&["Invalid pk \"five\" - object does not exist.".to_string()][..])
        );
    }
}
