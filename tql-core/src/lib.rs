//! TQL Core - table query language term parser, evaluator and functions.
//!
//! This crate provides the parts of the table engine that do not depend on
//! the row store: parsing SELECT / ORDER BY term lists, evaluating terms
//! against a row, and the registry of named functions terms can call.
//!
//! # Main Components
//!
//! - **Parser**: Parses term lists such as `name, UPPER(name) AS up` into [`Term`]s
//! - **Registry**: Maps function names to callables, preloaded with builtins
//! - **Executor**: Evaluates terms against rows, plus the loose value helpers
//!
//! # Example
//!
//! ```rust
//! use tql_core::{parse_terms, Evaluator, FunctionRegistry};
//! use serde_json::json;
//!
//! let registry = FunctionRegistry::new();
//! let row = json!({"name": "Anton", "likes": 3});
//! let row = row.as_object().unwrap();
//!
//! let terms = parse_terms("name, UPPER(name) AS upperName");
//! let evaluator = Evaluator::new(&registry);
//! evaluator.validate(&terms[1], row).unwrap();
//! assert_eq!(evaluator.evaluate(&terms[1], row).unwrap(), json!("ANTON"));
//! ```

pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod registry;

// Re-export main types for convenience
pub use error::{TqlError, TqlResult};
pub use executor::{BuiltinFunctions, Evaluator, Row};
pub use lexer::{Lexer, Token};
pub use parser::{parse_order_terms, parse_terms, Argument, CompareMode, Parser, Term};
pub use registry::{FunctionRegistry, SqlFunction};
