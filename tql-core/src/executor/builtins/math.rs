//! Math builtin functions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use super::format::sprintf;
use super::string::check_args;
use crate::error::{TqlError, TqlResult};
use crate::executor::helpers::{
    exact_i64, number_from_f64, to_f64_lossy, value_to_f64, value_to_string,
};

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("valid float prefix regex")
});

/// Call a math function. Returns None if function not found.
pub fn call(name: &str, args: &[Value]) -> TqlResult<Option<Value>> {
    let result = match name {
        "ABS" => {
            check_args(name, args, 1, 1)?;
            if let Some(n) = exact_i64(&args[0]).and_then(i64::checked_abs) {
                Some(Value::from(n))
            } else {
                let num = get_number(&args[0], name)?;
                Some(Value::Number(number_from_f64(num.abs())))
            }
        }

        "INTVAL" => {
            check_args(name, args, 1, 2)?;
            let base = args.get(1).map(|v| to_f64_lossy(v) as u32).unwrap_or(10);
            Some(Value::from(intval(&args[0], base)))
        }

        "FLOATVAL" => {
            check_args(name, args, 1, 3)?;
            let mut text = value_to_string(&args[0]);
            if let Some(sep) = args.get(2).map(value_to_string).filter(|s| !s.is_empty()) {
                text = text.replace(&sep, "");
            }
            if let Some(dec) = args.get(1).map(value_to_string).filter(|s| s != ".") {
                text = text.replace(&dec, ".");
            }
            let num = match &args[0] {
                Value::Number(n) if args.len() == 1 => n.as_f64().unwrap_or(0.0),
                _ => floatval(&text),
            };
            Some(Value::Number(number_from_f64(num)))
        }

        "SCALE" => {
            check_args(name, args, 1, 4)?;
            let one = Value::from(1);
            let zero = Value::from(0);
            let value = &args[0];
            let factor = args.get(1).unwrap_or(&one);
            let add = args.get(2).unwrap_or(&zero);

            let exact = match (exact_i64(value), exact_i64(factor), exact_i64(add)) {
                (Some(v), Some(f), Some(a)) => v.checked_mul(f).and_then(|p| p.checked_add(a)),
                _ => None,
            };
            let scaled = match exact {
                Some(n) => Value::from(n),
                None => Value::Number(number_from_f64(
                    to_f64_lossy(value) * to_f64_lossy(factor) + to_f64_lossy(add),
                )),
            };
            match args.get(3) {
                Some(Value::String(format)) => Some(Value::String(sprintf(format, &[scaled])?)),
                _ => Some(scaled),
            }
        }

        "NULLCOUNT" => {
            let nulls = args.iter().filter(|v| v.is_null()).count();
            Some(Value::Number(Number::from(nulls)))
        }

        _ => None,
    };

    Ok(result)
}

fn get_number(v: &Value, func_name: &str) -> TqlResult<f64> {
    value_to_f64(v).ok_or_else(|| {
        TqlError::ArityOrType(format!(
            "{}: expected a number, got {}",
            func_name,
            value_to_string(v)
        ))
    })
}

/// Leading float of a string: "1.5kg" is 1.5, "abc" is 0.
pub fn floatval(text: &str) -> f64 {
    FLOAT_PREFIX
        .find(text)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Integer conversion.
///
/// Strings are read up to the first invalid digit. With base 0 the base is
/// taken from a `0x`, `0b`, `0o` or `0` prefix; with base 16, 8 or 2 the
/// matching prefix is optional.
pub fn intval(value: &Value, base: u32) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map(|f| f as i64).unwrap_or(0)),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
        Value::String(s) => {
            if base == 10 {
                if let Some(f) = value_to_f64(value) {
                    return f as i64;
                }
            }
            parse_int_prefix(s.trim_start(), base)
        }
    }
}

fn parse_int_prefix(s: &str, base: u32) -> i64 {
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let lower = digits.to_ascii_lowercase();
    let (base, digits) = match base {
        0 if lower.starts_with("0x") => (16, &digits[2..]),
        0 if lower.starts_with("0b") => (2, &digits[2..]),
        0 if lower.starts_with("0o") => (8, &digits[2..]),
        0 if lower.starts_with('0') && digits.len() > 1 => (8, &digits[1..]),
        0 => (10, digits),
        16 if lower.starts_with("0x") => (16, &digits[2..]),
        8 if lower.starts_with("0o") => (8, &digits[2..]),
        2 if lower.starts_with("0b") => (2, &digits[2..]),
        b if (2..=36).contains(&b) => (b, digits),
        _ => (10, digits),
    };

    let mut result: i64 = 0;
    for c in digits.chars() {
        let Some(d) = c.to_digit(base) else { break };
        result = result
            .saturating_mul(i64::from(base))
            .saturating_add(i64::from(d));
    }
    if negative {
        -result
    } else {
        result
    }
}
