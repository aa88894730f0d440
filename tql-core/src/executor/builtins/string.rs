//! String builtin functions.

use regex::RegexBuilder;
use serde_json::Value;

use crate::error::{TqlError, TqlResult};
use crate::executor::helpers::{to_f64_lossy, value_to_string};

/// Call a string function. Returns None if function not found.
pub fn call(name: &str, args: &[Value]) -> TqlResult<Option<Value>> {
    let result = match name {
        "UPPER" => {
            check_args(name, args, 1, 1)?;
            Some(Value::String(value_to_string(&args[0]).to_uppercase()))
        }

        "LOWER" => {
            check_args(name, args, 1, 1)?;
            Some(Value::String(value_to_string(&args[0]).to_lowercase()))
        }

        "FIRSTUPPER" => {
            check_args(name, args, 1, 1)?;
            let s = value_to_string(&args[0]);
            let mut chars = s.chars();
            let text = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            Some(Value::String(text))
        }

        "TRIM" => {
            check_args(name, args, 1, 2)?;
            let s = value_to_string(&args[0]);
            let text = match args.get(1) {
                Some(mask) => {
                    let mask: Vec<char> = value_to_string(mask).chars().collect();
                    s.trim_matches(|c: char| mask.contains(&c)).to_string()
                }
                None => s
                    .trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
                    .to_string(),
            };
            Some(Value::String(text))
        }

        "REPLACE" => {
            check_args(name, args, 3, 3)?;
            let search = value_to_string(&args[0]);
            let replace = value_to_string(&args[1]);
            Some(replace_in(&args[2], &search, &replace))
        }

        "SUBSTR" => {
            check_args(name, args, 2, 3)?;
            let s = value_to_string(&args[0]);
            let start = to_f64_lossy(&args[1]) as i64;
            let length = match args.get(2) {
                None | Some(Value::Null) => None,
                Some(v) => Some(to_f64_lossy(v) as i64),
            };
            Some(Value::String(substr(&s, start, length)))
        }

        "LIKE" => {
            check_args(name, args, 2, 2)?;
            let value = value_to_string(&args[0]);
            let pattern = value_to_string(&args[1]);
            Some(Value::from(i64::from(like(&value, &pattern)?)))
        }

        "CONCAT" => {
            let text: String = args.iter().map(value_to_string).collect();
            Some(Value::String(text))
        }

        "IMPLODE" => {
            check_args(name, args, 1, 2)?;
            let delimiter = args.get(1).map(value_to_string).unwrap_or_else(|| ",".into());
            match &args[0] {
                Value::Array(_) | Value::Object(_) => {
                    let mut leaves = Vec::new();
                    collect_leaves(&args[0], &mut leaves);
                    Some(Value::String(leaves.join(&delimiter)))
                }
                other => Some(other.clone()),
            }
        }

        "SPLIT" => {
            check_args(name, args, 1, 3)?;
            let s = value_to_string(&args[0]);
            let delimiter = args.get(1).map(value_to_string).unwrap_or_else(|| " ".into());
            if delimiter.is_empty() {
                return Err(TqlError::ArityOrType(
                    "SPLIT delimiter must not be empty".to_string(),
                ));
            }
            let index = args.get(2).map(|v| to_f64_lossy(v) as i64).unwrap_or(0);
            let part = usize::try_from(index)
                .ok()
                .and_then(|i| s.split(delimiter.as_str()).nth(i))
                .unwrap_or("");
            Some(Value::String(part.to_string()))
        }

        _ => None,
    };

    Ok(result)
}

fn replace_in(subject: &Value, search: &str, replace: &str) -> Value {
    match subject {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| replace_in(item, search, replace))
                .collect(),
        ),
        _ if search.is_empty() => subject.clone(),
        other => Value::String(value_to_string(other).replace(search, replace)),
    }
}

/// Character-based substring. A negative `start` counts from the end, a
/// negative `length` stops that many characters before the end.
pub fn substr(s: &str, start: i64, length: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let from = if start < 0 {
        (len + start).max(0)
    } else {
        start.min(len)
    };
    let to = match length {
        None => len,
        Some(l) if l < 0 => (len + l).max(from),
        Some(l) => (from + l).min(len),
    };
    chars[from as usize..to as usize].iter().collect()
}

/// SQL LIKE: `%` matches any run, `_` any single character, case-insensitive.
pub fn like(value: &str, pattern: &str) -> TqlResult<bool> {
    let mut source = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*?"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    let re = RegexBuilder::new(&source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| TqlError::InvalidPattern(e.to_string()))?;
    Ok(re.is_match(value))
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        leaf => out.push(value_to_string(leaf)),
    }
}

pub(super) fn check_args(name: &str, args: &[Value], min: usize, max: usize) -> TqlResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        return Err(TqlError::ArityOrType(format!(
            "{} requires {} argument(s), {} given",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}
