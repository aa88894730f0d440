//! Builtin functions for table query terms.
//!
//! Every builtin is registered under its upper-case name in the default
//! [`FunctionRegistry`](crate::registry::FunctionRegistry).

mod datetime;
mod format;
mod math;
mod string;

use serde_json::Value;

use crate::error::{TqlError, TqlResult};

pub use datetime::format_date;
pub use format::sprintf;
pub use math::{floatval, intval};
pub use string::{like, substr};

/// Container for builtin function implementations.
pub struct BuiltinFunctions;

impl BuiltinFunctions {
    /// Names of all builtins.
    pub const NAMES: &'static [&'static str] = &[
        "ABS",
        "UPPER",
        "LOWER",
        "FIRSTUPPER",
        "FORMAT",
        "DATEFORMAT",
        "REPLACE",
        "SUBSTR",
        "LIKE",
        "INTVAL",
        "FLOATVAL",
        "TRIM",
        "SCALE",
        "NULLCOUNT",
        "CONCAT",
        "IMPLODE",
        "SPLIT",
    ];

    /// Call a builtin function by its exact name.
    pub fn call(name: &str, args: &[Value]) -> TqlResult<Value> {
        if name == "FORMAT" {
            let Some((format, rest)) = args.split_first() else {
                return Err(TqlError::ArityOrType(
                    "FORMAT requires a format string".to_string(),
                ));
            };
            let format = crate::executor::helpers::value_to_string(format);
            return sprintf(&format, rest).map(Value::String);
        }

        // String functions
        if let Some(result) = string::call(name, args)? {
            return Ok(result);
        }

        // Math functions
        if let Some(result) = math::call(name, args)? {
            return Ok(result);
        }

        // DateTime functions
        if let Some(result) = datetime::call(name, args)? {
            return Ok(result);
        }

        Err(TqlError::UnknownFunction(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_name_dispatches() {
        for name in BuiltinFunctions::NAMES {
            let result = BuiltinFunctions::call(name, &[json!("1"), json!("1"), json!("1")]);
            assert!(
                !matches!(result, Err(TqlError::UnknownFunction(_))),
                "{} is listed but not dispatched",
                name
            );
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(
            BuiltinFunctions::call("FORMAT", &[json!("%05.2f"), json!(3.33333)]).unwrap(),
            json!("03.33")
        );
        assert!(matches!(
            BuiltinFunctions::call("FORMAT", &[]),
            Err(TqlError::ArityOrType(_))
        ));
    }

    #[test]
    fn test_names_are_exact() {
        assert!(matches!(
            BuiltinFunctions::call("upper", &[json!("x")]),
            Err(TqlError::UnknownFunction(_))
        ));
    }
}
