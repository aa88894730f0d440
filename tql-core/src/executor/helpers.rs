//! Core value helpers shared by the evaluator and the table engines.
//!
//! This module contains:
//! - value_to_string: Loose stringification of JSON values
//! - value_to_f64 / is_numeric: Numeric coercion of numbers and numeric strings
//! - add_values: Numeric addition keeping integers exact
//! - loose_equals / compare_values: Loose ordering used by sort and min/max
//! - natural_compare: Natural ordering of digit runs

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Create a serde_json::Number from an f64 value.
#[inline]
pub fn number_from_f64(n: f64) -> Number {
    Number::from_f64(n).unwrap_or_else(|| Number::from(0))
}

/// Wrap an f64 as a JSON value, using an integer when the value is integral.
pub fn integral_or_float(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Value::Number(number_from_f64(n))
    }
}

/// Stringify a value the way loosely-typed callers expect.
///
/// - Null: ""
/// - Bool: "1" or ""
/// - Number: integer text, or the shortest float text ("1" for 1.0)
/// - String: unchanged
/// - Array / Object: compact JSON
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        format!("{}", n.as_f64().unwrap_or(0.0))
    }
}

/// Parse a numeric string. Surrounding whitespace is allowed, nothing else.
pub fn parse_numeric_str(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let valid = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !valid || !t.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    t.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Numeric value of a number or numeric string.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

/// True for numbers and numeric strings.
#[inline]
pub fn is_numeric(value: &Value) -> bool {
    value_to_f64(value).is_some()
}

/// Numeric coercion with zero for anything non-numeric.
pub fn to_f64_lossy(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => value_to_f64(value).unwrap_or(0.0),
    }
}

/// Integer value of an integer number or an integer string.
pub fn exact_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Add two numeric values. Integer operands stay integers unless the sum
/// overflows; anything else is added as f64.
pub fn add_values(a: &Value, b: &Value) -> Value {
    if let (Some(x), Some(y)) = (exact_i64(a), exact_i64(b)) {
        if let Some(sum) = x.checked_add(y) {
            return Value::Number(Number::from(sum));
        }
    }
    Value::Number(number_from_f64(to_f64_lossy(a) + to_f64_lossy(b)))
}

/// Loose equality: numeric values compare by value, everything else by
/// [`compare_values`].
#[inline]
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Compare two JSON values for ordering.
///
/// Null < everything else. Numbers and numeric strings compare numerically,
/// strings bytewise, a number against a non-numeric string by its text.
/// Arrays and objects compare equal.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Bool(x), other) | (other, Value::Bool(x)) => {
            let truthy = match other {
                Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
                Value::String(s) => !s.is_empty() && s != "0",
                Value::Array(arr) => !arr.is_empty(),
                Value::Object(obj) => !obj.is_empty(),
                _ => false,
            };
            let ord = x.cmp(&truthy);
            if matches!(a, Value::Bool(_)) {
                ord
            } else {
                ord.reverse()
            }
        }
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            Ordering::Equal
        }
        _ => match (value_to_f64(a), value_to_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => value_to_string(a).cmp(&value_to_string(b)),
        },
    }
}

/// Natural comparison of the stringified values.
pub fn natural_compare_values(a: &Value, b: &Value) -> Ordering {
    natural_compare(&value_to_string(a), &value_to_string(b))
}

/// Natural string comparison: runs of digits compare by numeric value, so
/// `"A2" < "A12"`. Other characters compare one by one.
pub fn natural_compare(a: &str, b: &str) -> Ordering {
    let a = a.trim_start().as_bytes();
    let b = b.trim_start().as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let ord = compare_digit_runs(&a[start_a..i], &b[start_b..j]);
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let strip = |run: &[u8]| -> usize { run.iter().take_while(|&&d| d == b'0').count() };
    let a_trim = &a[strip(a)..];
    let b_trim = &b[strip(b)..];
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}
