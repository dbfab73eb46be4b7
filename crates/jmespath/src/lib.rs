//! JMESPath expression compiler and evaluator over `serde_json` values.
//!
//! # Overview
//!
//! An expression is compiled once into an immutable [`Expression`] and then
//! evaluated against any number of documents, from any number of threads.
//! Data that does not match the shape an expression expects evaluates to
//! `null`; only syntax errors and a few hard failures (for example an
//! undecodable base64 payload) are reported as errors.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let expr = jmespath_engine::compile("people[?age > `30`].name | sort(@)").unwrap();
//! let data = json!({
//!     "people": [
//!         {"name": "b", "age": 45},
//!         {"name": "a", "age": 31},
//!         {"name": "c", "age": 20}
//!     ]
//! });
//!
//! assert_eq!(expr.search(&data).unwrap(), json!(["a", "b"]));
//! ```

pub mod ast;
pub mod error;
pub mod eval_ctx;
pub mod expression;
pub mod functions;
pub mod interpreter;
pub mod lexer;
pub mod number;
pub mod operators;
pub mod parser;
pub mod types;
pub mod value;

pub use ast::{Ast, KeyValuePair, Projection, Slice};
pub use error::{Error, EvalError, ParseError};
pub use eval_ctx::EvalCtx;
pub use expression::{default_runtime, Expression, Runtime, RuntimeOptions};
pub use types::{Arity, EvalFn, FunctionDefinition, FunctionMap};
pub use value::JpValue;

use serde_json::Value;

/// Compiles `text` with the default runtime.
pub fn compile(text: &str) -> Result<Expression, ParseError> {
    default_runtime().compile(text)
}

/// Compiles `text` and evaluates it against `data` in one step.
pub fn search(text: &str, data: &Value) -> Result<Value, Error> {
    Ok(compile(text)?.search(data)?)
}
