//! printf-style formatting used by FORMAT and SCALE.
//!
//! Conversion syntax: `%[argnum$][flags][width][.precision]specifier` with
//! flags `-`, `+`, ` `, `0` and `'c` (custom padding character), and
//! specifiers `b c d e E f F g G o s u x X` plus `%%`.

use serde_json::Value;

use crate::error::{TqlError, TqlResult};
use crate::executor::helpers::{to_f64_lossy, value_to_string};

#[derive(Debug, Default)]
struct Directive {
    left: bool,
    plus: bool,
    pad: Option<char>,
    width: usize,
    precision: Option<usize>,
}

/// Format `args` according to `format`.
pub fn sprintf(format: &str, args: &[Value]) -> TqlResult<String> {
    let mut out = String::with_capacity(format.len() + 16);
    let mut chars = format.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        // Optional argnum$, parsed as digits followed by '$'.
        let mut directive = Directive::default();
        let mut digits = String::new();
        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            digits.push(*d);
            chars.next();
        }
        let mut position = None;
        if !digits.is_empty() && chars.peek() == Some(&'$') {
            chars.next();
            let n: usize = digits.parse().unwrap_or(0);
            if n == 0 {
                return Err(TqlError::ArityOrType(
                    "FORMAT argument number must be greater than zero".to_string(),
                ));
            }
            position = Some(n - 1);
            digits.clear();
        }

        if digits.is_empty() {
            loop {
                match chars.peek() {
                    Some('-') => directive.left = true,
                    Some('+') => directive.plus = true,
                    Some(' ') => directive.pad = Some(' '),
                    Some('0') => directive.pad = Some('0'),
                    Some('\'') => {
                        chars.next();
                        directive.pad = chars.peek().copied();
                    }
                    _ => break,
                }
                chars.next();
            }
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
        } else if digits.starts_with('0') && digits.len() > 1 {
            // "%05d": the leading zero was a flag.
            directive.pad = Some('0');
            digits.remove(0);
        }
        directive.width = digits.parse().unwrap_or(0);

        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                precision.push(*d);
                chars.next();
            }
            directive.precision = Some(precision.parse().unwrap_or(0));
        }

        let Some(conversion) = chars.next() else {
            return Err(TqlError::ArityOrType(
                "FORMAT string ends inside a conversion".to_string(),
            ));
        };

        let index = match position {
            Some(p) => p,
            None => {
                next_arg += 1;
                next_arg - 1
            }
        };
        let arg = args.get(index).ok_or_else(|| {
            TqlError::ArityOrType(format!(
                "FORMAT expects at least {} argument(s), {} given",
                index + 1,
                args.len()
            ))
        })?;

        let text = convert(conversion, arg, &directive)?;
        out.push_str(&pad(text, &directive, conversion));
    }
    Ok(out)
}

fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map(|f| f as i64).unwrap_or(0)),
        _ => to_f64_lossy(value) as i64,
    }
}

fn convert(conversion: char, arg: &Value, directive: &Directive) -> TqlResult<String> {
    let with_sign = |text: String, negative: bool| {
        if !negative && directive.plus {
            format!("+{}", text)
        } else {
            text
        }
    };

    let text = match conversion {
        'd' | 'i' => {
            let n = to_int(arg);
            with_sign(n.to_string(), n < 0)
        }
        'u' => (to_int(arg) as u64).to_string(),
        'b' => format!("{:b}", to_int(arg) as u64),
        'o' => format!("{:o}", to_int(arg) as u64),
        'x' => format!("{:x}", to_int(arg) as u64),
        'X' => format!("{:X}", to_int(arg) as u64),
        'c' => char::from_u32(to_int(arg) as u32)
            .map(String::from)
            .unwrap_or_default(),
        'f' | 'F' => {
            let f = to_f64_lossy(arg);
            with_sign(format!("{:.*}", directive.precision.unwrap_or(6), f), f < 0.0)
        }
        'e' | 'E' => {
            let f = to_f64_lossy(arg);
            let text = exponent(f, directive.precision.unwrap_or(6));
            let text = if conversion == 'E' {
                text.to_uppercase()
            } else {
                text
            };
            with_sign(text, f < 0.0)
        }
        'g' | 'G' => {
            let f = to_f64_lossy(arg);
            let text = general(f, directive.precision.unwrap_or(6));
            let text = if conversion == 'G' {
                text.to_uppercase()
            } else {
                text
            };
            with_sign(text, f < 0.0)
        }
        's' => {
            let s = value_to_string(arg);
            match directive.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            }
        }
        other => {
            return Err(TqlError::ArityOrType(format!(
                "FORMAT: unknown conversion '{}'",
                other
            )))
        }
    };
    Ok(text)
}

/// `1.500000e+1` style: at least one exponent digit, always signed.
fn exponent(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, f);
    match raw.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{}e{}", mantissa, exp),
        Some((mantissa, exp)) => format!("{}e+{}", mantissa, exp),
        None => raw,
    }
}

fn general(f: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if f == 0.0 {
        return "0".to_string();
    }
    let exp = f.abs().log10().floor() as i32;
    if exp < -4 || exp >= precision as i32 {
        let text = exponent(f, precision - 1);
        match text.split_once('e') {
            Some((mantissa, e)) => format!("{}e{}", trim_fraction(mantissa), e),
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn pad(text: String, directive: &Directive, conversion: char) -> String {
    let len = text.chars().count();
    if len >= directive.width {
        return text;
    }
    let fill = directive.pad.unwrap_or(' ');
    let padding: String = std::iter::repeat(fill).take(directive.width - len).collect();

    if directive.left {
        // Zero padding never goes to the right of a number.
        let fill_right = if fill == '0' && conversion != 's' {
            " ".repeat(directive.width - len)
        } else {
            padding
        };
        return format!("{}{}", text, fill_right);
    }

    let numeric = matches!(
        conversion,
        'd' | 'i' | 'e' | 'E' | 'f' | 'F' | 'g' | 'G'
    );
    if fill == '0' && numeric && (text.starts_with('-') || text.starts_with('+')) {
        let (sign, digits) = text.split_at(1);
        return format!("{}{}{}", sign, padding, digits);
    }
    format!("{}{}", padding, text)
}
