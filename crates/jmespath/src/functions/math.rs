//! Numeric functions.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::number;
use crate::types::{Arity, FunctionDefinition};
use crate::value::{type_name, JpValue};
use serde_json::{Number, Value};
use std::sync::Arc;

/// All elements as numbers; an empty array or any non-number fails.
fn numbers<'v>(name: &str, values: &'v [Value]) -> Result<Vec<&'v Number>, EvalError> {
    if values.is_empty() {
        return Err(EvalError::type_error(format!(
            "{name} expects a non-empty array of numbers"
        )));
    }
    values
        .iter()
        .map(|v| match v {
            Value::Number(n) => Ok(n),
            other => Err(EvalError::type_error(format!(
                "{name} expects an array of numbers, found {}",
                type_name(other)
            ))),
        })
        .collect()
}

fn abs_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    Ok(number::abs(args[0].as_number()?))
}

fn ceil_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    Ok(number::ceil(args[0].as_number()?))
}

fn floor_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    Ok(number::floor(args[0].as_number()?))
}

fn avg_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let nums = numbers("avg", args[0].as_array()?)?;
    Ok(number::avg(&nums))
}

fn sum_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let nums = numbers("sum", args[0].as_array()?)?;
    Ok(number::sum(&nums))
}

pub fn functions() -> Vec<Arc<FunctionDefinition>> {
    vec![
        Arc::new(FunctionDefinition {
            name: "abs",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: abs_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "avg",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: avg_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "ceil",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: ceil_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "floor",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: floor_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "sum",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: sum_eval,
        }),
    ]
}
