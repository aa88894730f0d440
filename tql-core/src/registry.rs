//! Function registry.
//!
//! Maps names to callables used by SELECT and ORDER BY terms. Lookups are
//! exact, case-sensitive string matches. Built-in names are upper-case.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::TqlResult;
use crate::executor::BuiltinFunctions;

/// A named callable invoked by the evaluator.
pub trait SqlFunction: Send + Sync {
    fn call(&self, args: &[Value]) -> TqlResult<Value>;
}

impl<F> SqlFunction for F
where
    F: Fn(&[Value]) -> TqlResult<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> TqlResult<Value> {
        self(args)
    }
}

/// Calls one builtin by its registered name.
struct Builtin(&'static str);

impl SqlFunction for Builtin {
    fn call(&self, args: &[Value]) -> TqlResult<Value> {
        BuiltinFunctions::call(self.0, args)
    }
}

/// Read-only template holding the builtin library. Every new registry
/// starts as a clone of it.
static DEFAULT_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(|| {
    let mut registry = FunctionRegistry::empty();
    for name in BuiltinFunctions::NAMES {
        registry.register_arc(*name, Arc::new(Builtin(*name)));
    }
    registry
});

/// Name to function mapping.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn SqlFunction>>,
}

impl FunctionRegistry {
    /// A registry preloaded with the builtin library.
    pub fn new() -> Self {
        DEFAULT_REGISTRY.clone()
    }

    /// A registry without any functions.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register a function. An existing entry with the same name is replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> TqlResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Register an already shared function.
    pub fn register_arc(&mut self, name: impl Into<String>, function: Arc<dyn SqlFunction>) {
        self.functions.insert(name.into(), function);
    }

    /// Register several functions at once, later entries winning.
    pub fn register_many<I, N>(&mut self, functions: I)
    where
        I: IntoIterator<Item = (N, Arc<dyn SqlFunction>)>,
        N: Into<String>,
    {
        for (name, function) in functions {
            self.register_arc(name, function);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn SqlFunction> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    /// Shared handle to a registered function.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SqlFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
