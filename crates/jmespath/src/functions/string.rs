//! String and type-conversion functions.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::number;
use crate::types::{Arity, FunctionDefinition};
use crate::value::{json_equal, type_name, JpValue};
use serde_json::Value;
use std::sync::Arc;

fn contains_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match args[0].as_json()? {
        Value::Array(items) => {
            let needle = args[1].as_json()?;
            Ok(Value::Bool(items.iter().any(|v| json_equal(v, needle))))
        }
        Value::String(s) => Ok(Value::Bool(s.contains(args[1].as_str()?))),
        other => Err(EvalError::type_error(format!(
            "contains expects an array or a string, found {}",
            type_name(other)
        ))),
    }
}

fn starts_with_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(args[0].as_str()?.starts_with(args[1].as_str()?)))
}

fn ends_with_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(args[0].as_str()?.ends_with(args[1].as_str()?)))
}

fn join_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let glue = args[0].as_str()?;
    let parts = args[1]
        .as_array()?
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.as_str()),
            other => Err(EvalError::type_error(format!(
                "join expects an array of strings, found {}",
                type_name(other)
            ))),
        })
        .collect::<Result<Vec<&str>, EvalError>>()?;
    Ok(Value::String(parts.join(glue)))
}

/// Strings count Unicode scalar values, not UTF-16 units or bytes.
fn length_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let len = match args[0].as_json()? {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "length expects a string, array or object, found {}",
                type_name(other)
            )))
        }
    };
    Ok(Value::from(len))
}

fn to_string_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match args[0].as_json()? {
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Ok(Value::String(other.to_string())),
    }
}

fn to_number_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match args[0].as_json()? {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        Value::String(s) => number::parse(s)
            .ok_or_else(|| EvalError::type_error(format!("cannot convert \"{s}\" to a number"))),
        other => Err(EvalError::type_error(format!(
            "to_number cannot convert {}",
            type_name(other)
        ))),
    }
}

fn type_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    args[0]
        .type_name()
        .map(|name| Value::String(name.to_string()))
        .ok_or_else(|| EvalError::type_error("type is undefined for expression references"))
}

pub fn functions() -> Vec<Arc<FunctionDefinition>> {
    vec![
        Arc::new(FunctionDefinition {
            name: "contains",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: contains_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "ends_with",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: ends_with_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "join",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: join_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "length",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: length_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "starts_with",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: starts_with_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "to_number",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: to_number_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "to_string",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: to_string_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "type",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: type_eval,
        }),
    ]
}
