//! Compiled expressions and the runtime that compiles them.

use crate::ast::Ast;
use crate::error::{EvalError, ParseError};
use crate::eval_ctx::EvalCtx;
use crate::functions::functions_map;
use crate::interpreter::interpret;
use crate::parser::parse;
use crate::types::{FunctionDefinition, FunctionMap};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Options for a [`Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Register `json`, `base64`, `base64_gzip` and their `powertools_*`
    /// aliases.
    pub extensions: bool,
    /// Deepest expression nesting the parser accepts.
    pub max_nesting_depth: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions {
            extensions: true,
            max_nesting_depth: 256,
        }
    }
}

impl RuntimeOptions {
    pub fn extensions(mut self, enabled: bool) -> Self {
        self.extensions = enabled;
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

/// Compiles expressions against a fixed function registry.
///
/// Functions registered after an expression was compiled are not visible to
/// that expression; each one holds the registry it was compiled with.
#[derive(Debug, Clone)]
pub struct Runtime {
    options: RuntimeOptions,
    functions: Arc<FunctionMap>,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(RuntimeOptions::default())
    }
}

impl Runtime {
    pub fn new(options: RuntimeOptions) -> Self {
        let functions = Arc::new(functions_map(options.extensions));
        Runtime { options, functions }
    }

    /// Adds a function (and its aliases), replacing any existing entry with
    /// the same name.
    pub fn register(&mut self, definition: FunctionDefinition) {
        let definition = Arc::new(definition);
        let functions = Arc::make_mut(&mut self.functions);
        functions.insert(definition.name.to_string(), Arc::clone(&definition));
        for alias in definition.aliases {
            functions.insert(alias.to_string(), Arc::clone(&definition));
        }
    }

    pub fn functions(&self) -> &FunctionMap {
        &self.functions
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn compile(&self, text: &str) -> Result<Expression, ParseError> {
        let ast = parse(text, &self.functions, self.options.max_nesting_depth)?;
        log::trace!("compiled JMESPath expression {text:?}");
        Ok(Expression {
            original: text.to_string(),
            ast,
            functions: Arc::clone(&self.functions),
        })
    }
}

/// The process-wide runtime used by [`crate::compile`] and [`crate::search`].
pub fn default_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(Runtime::default)
}

/// An immutable compiled expression.
///
/// Cheap to clone and safe to share across threads; every [`search`] call
/// works on its own evaluation context.
///
/// [`search`]: Expression::search
#[derive(Clone)]
pub struct Expression {
    original: String,
    ast: Ast,
    functions: Arc<FunctionMap>,
}

impl Expression {
    /// Evaluates the expression against `data`.
    ///
    /// Data that does not fit the expression yields `Ok(Value::Null)`. `Err`
    /// is returned only for hard failures such as an undecodable base64
    /// payload.
    pub fn search(&self, data: &Value) -> Result<Value, EvalError> {
        let ctx = EvalCtx::new(&self.functions);
        match interpret(&self.ast, data, &ctx) {
            Err(e) if !e.is_hard() => {
                log::debug!("{:?} evaluated to null: {e}", self.original);
                Ok(Value::Null)
            }
            result => result,
        }
    }

    /// The source text this expression was compiled from.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("original", &self.original)
            .field("ast", &self.ast)
            .finish()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original && self.ast == other.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Arity;
    use crate::value::JpValue;
    use serde_json::json;

    fn double(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
        let n = args[0]
            .as_number()?
            .as_f64()
            .ok_or_else(|| EvalError::type_error("not a number"))?;
        Ok(json!(n * 2.0))
    }

    #[test]
    fn expressions_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expression>();
        assert_send_sync::<Runtime>();
    }

    #[test]
    fn registered_functions_are_callable() {
        let mut runtime = Runtime::default();
        assert!(runtime.compile("double(a)").is_err());
        runtime.register(FunctionDefinition {
            name: "double",
            aliases: &["twice"],
            arity: Arity::Fixed(1),
            eval_fn: double,
        });
        let expr = runtime.compile("twice(a)").unwrap();
        assert_eq!(expr.search(&json!({"a": 21})).unwrap(), json!(42.0));
        assert!(default_runtime().compile("double(a)").is_err());
    }

    #[test]
    fn extensions_can_be_disabled() {
        let runtime = Runtime::new(RuntimeOptions::default().extensions(false));
        let err = runtime.compile("json(a)").unwrap_err();
        assert_eq!(err.message, "Unknown function: json");
    }

    #[test]
    fn soft_errors_become_null() {
        let runtime = Runtime::default();
        let expr = runtime.compile("a =~ 'x'").unwrap();
        assert_eq!(expr.search(&json!({"a": 1})).unwrap(), json!(null));
        assert_eq!(expr.search(&json!({"a": "xyz"})).unwrap(), json!(true));
    }

    #[test]
    fn display_round_trips_source() {
        let expr = Runtime::default().compile("foo[?a].b").unwrap();
        assert_eq!(expr.to_string(), "foo[?a].b");
        assert_eq!(expr.as_str(), "foo[?a].b");
        assert_eq!(expr.clone(), expr);
    }
}
