//! Executor module for table query terms.
//!
//! The [`Evaluator`] walks a parsed [`Term`] against one row, resolving
//! function arguments as field references, quoted literals or nested calls,
//! and invoking functions from a [`FunctionRegistry`].

mod builtins;
mod helpers;

pub use builtins::{format_date, floatval, intval, like, sprintf, substr, BuiltinFunctions};
pub use helpers::*;

use serde_json::{Map, Value};

use crate::error::{TqlError, TqlResult};
use crate::parser::{Argument, Term};
use crate::registry::FunctionRegistry;

/// A row as seen by the evaluator.
pub type Row = Map<String, Value>;

/// Evaluates terms against rows.
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Check a term against a schema row before any row is touched.
    ///
    /// Every function (nested ones included) must be registered and every
    /// field reference must be a column of `schema`. Literals are never
    /// checked.
    pub fn validate(&self, term: &Term, schema: &Row) -> TqlResult<()> {
        match &term.function {
            Some(function) => {
                if !self.registry.has(function) {
                    return Err(TqlError::UnknownFunction(function.clone()));
                }
                for arg in &term.args {
                    match arg.argument() {
                        Argument::Literal(_) => {}
                        Argument::Field(name) => {
                            if !schema.contains_key(name) {
                                return Err(TqlError::UnknownField(name.to_string()));
                            }
                        }
                        Argument::Call(call) => self.validate(call, schema)?,
                    }
                }
                Ok(())
            }
            None if schema.contains_key(&term.name) => Ok(()),
            None => Err(TqlError::UnknownField(term.name.clone())),
        }
    }

    /// Evaluate a term for one row.
    ///
    /// Bare field terms yield the row's value. Columns missing from this
    /// particular row resolve to null; only the schema row is validated.
    pub fn evaluate(&self, term: &Term, row: &Row) -> TqlResult<Value> {
        let Some(function) = &term.function else {
            return Ok(row.get(&term.name).cloned().unwrap_or(Value::Null));
        };
        let callable = self
            .registry
            .resolve(function)
            .ok_or_else(|| TqlError::UnknownFunction(function.clone()))?;

        let args = term
            .args
            .iter()
            .map(|arg| self.resolve_argument(arg, row))
            .collect::<TqlResult<Vec<_>>>()?;

        tracing::trace!("calling {} with {} argument(s)", function, args.len());
        callable.call(&args)
    }

    fn resolve_argument(&self, arg: &Term, row: &Row) -> TqlResult<Value> {
        match arg.argument() {
            Argument::Literal(text) => Ok(Value::String(text.to_string())),
            Argument::Field(name) => Ok(row.get(name).cloned().unwrap_or(Value::Null)),
            Argument::Call(call) => self.evaluate(call, row),
        }
    }
}
