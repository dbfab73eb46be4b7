//! Object functions.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, FunctionDefinition};
use crate::value::JpValue;
use serde_json::{Map, Value};
use std::sync::Arc;

fn keys_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let obj = args[0].as_object()?;
    Ok(Value::Array(obj.keys().cloned().map(Value::String).collect()))
}

fn values_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let obj = args[0].as_object()?;
    Ok(Value::Array(obj.values().cloned().collect()))
}

fn merge_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let mut merged = Map::new();
    for arg in args {
        for (key, value) in arg.as_object()? {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

pub fn functions() -> Vec<Arc<FunctionDefinition>> {
    vec![
        Arc::new(FunctionDefinition {
            name: "keys",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: keys_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "merge",
            aliases: &[],
            arity: Arity::Variadic(1),
            eval_fn: merge_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "values",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: values_eval,
        }),
    ]
}
