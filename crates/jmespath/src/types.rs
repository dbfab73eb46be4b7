use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::value::JpValue;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Function arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Fixed(usize),
    /// At least `min` arguments, no upper bound.
    Variadic(usize),
}

/// The type of a function body.
///
/// Arguments arrive evaluated, except `&expr` arguments which arrive as
/// [`JpValue::Expression`].
pub type EvalFn = for<'a, 'b> fn(&[JpValue<'a>], &EvalCtx<'b>) -> Result<Value, EvalError>;

/// A built-in or registered function.
pub struct FunctionDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub arity: Arity,
    pub eval_fn: EvalFn,
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Map of function name/alias -> definition.
pub type FunctionMap = HashMap<String, Arc<FunctionDefinition>>;

/// Checks an argument count against an arity, returning the message to
/// report on mismatch.
pub fn check_arity(name: &str, arity: Arity, count: usize) -> Result<(), String> {
    match arity {
        Arity::Fixed(n) if count != n => Err(format!(
            "Function \"{name}\" expects {n} argument{}, got {count}",
            if n == 1 { "" } else { "s" }
        )),
        Arity::Variadic(min) if count < min => Err(format!(
            "Function \"{name}\" expects at least {min} argument{}, got {count}",
            if min == 1 { "" } else { "s" }
        )),
        _ => Ok(()),
    }
}

/// Builds a `FunctionMap` from a list of definitions, indexing aliases too.
pub fn functions_to_map(functions: Vec<Arc<FunctionDefinition>>) -> FunctionMap {
    let mut map = HashMap::new();
    for func in functions {
        map.insert(func.name.to_string(), Arc::clone(&func));
        for alias in func.aliases {
            map.insert(alias.to_string(), Arc::clone(&func));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_messages() {
        assert!(check_arity("abs", Arity::Fixed(1), 1).is_ok());
        assert_eq!(
            check_arity("abs", Arity::Fixed(1), 2).unwrap_err(),
            "Function \"abs\" expects 1 argument, got 2"
        );
        assert!(check_arity("merge", Arity::Variadic(1), 5).is_ok());
        assert_eq!(
            check_arity("merge", Arity::Variadic(1), 0).unwrap_err(),
            "Function \"merge\" expects at least 1 argument, got 0"
        );
    }
}
