//! Array functions, including the expression-driven `map`, `sort_by`,
//! `max_by` and `min_by`.

use crate::ast::Ast;
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::interpreter::interpret;
use crate::types::{Arity, FunctionDefinition};
use crate::value::{compare, type_name, JpValue};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Ensures every value is a number, or every value is a string.
fn ensure_comparable<'v>(
    name: &str,
    values: impl IntoIterator<Item = &'v Value>,
) -> Result<(), EvalError> {
    let mut expected: Option<&'static str> = None;
    for value in values {
        let actual = type_name(value);
        match expected {
            None if matches!(value, Value::Number(_) | Value::String(_)) => expected = Some(actual),
            Some(kind) if kind == actual => {}
            _ => {
                return Err(EvalError::type_error(format!(
                    "{name} expects all numbers or all strings, found {actual}"
                )))
            }
        }
    }
    Ok(())
}

fn ordering(a: &Value, b: &Value) -> Ordering {
    compare(a, b).unwrap_or(Ordering::Equal)
}

/// Evaluates `expr` against every element to produce sort keys.
fn evaluate_keys(expr: &Ast, items: &[Value], ctx: &EvalCtx<'_>) -> Result<Vec<Value>, EvalError> {
    items.iter().map(|item| interpret(expr, item, ctx)).collect()
}

/// Index of the extreme key under `wanted`; ties keep the earliest element.
fn extreme_index(keys: &[Value], wanted: Ordering) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, key) in keys.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(b) if compare(key, &keys[b]) == Some(wanted) => best = Some(i),
            _ => {}
        }
    }
    best
}

fn extreme(name: &str, args: &[JpValue<'_>], wanted: Ordering) -> Result<Value, EvalError> {
    let items = args[0].as_array()?;
    ensure_comparable(name, items)?;
    Ok(extreme_index(items, wanted)
        .map(|i| items[i].clone())
        .unwrap_or(Value::Null))
}

fn extreme_by(
    name: &str,
    args: &[JpValue<'_>],
    ctx: &EvalCtx<'_>,
    wanted: Ordering,
) -> Result<Value, EvalError> {
    let items = args[0].as_array()?;
    let expr = args[1].as_expression()?;
    let keys = evaluate_keys(expr, items, ctx)?;
    ensure_comparable(name, &keys)?;
    Ok(extreme_index(&keys, wanted)
        .map(|i| items[i].clone())
        .unwrap_or(Value::Null))
}

fn max_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    extreme("max", args, Ordering::Greater)
}

fn min_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    extreme("min", args, Ordering::Less)
}

fn max_by_eval(args: &[JpValue<'_>], ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    extreme_by("max_by", args, ctx, Ordering::Greater)
}

fn min_by_eval(args: &[JpValue<'_>], ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    extreme_by("min_by", args, ctx, Ordering::Less)
}

fn sort_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let items = args[0].as_array()?;
    ensure_comparable("sort", items)?;
    let mut sorted = items.clone();
    sorted.sort_by(ordering);
    Ok(Value::Array(sorted))
}

fn sort_by_eval(args: &[JpValue<'_>], ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let items = args[0].as_array()?;
    let expr = args[1].as_expression()?;
    let keys = evaluate_keys(expr, items, ctx)?;
    ensure_comparable("sort_by", &keys)?;
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| ordering(&keys[a], &keys[b]));
    Ok(Value::Array(order.into_iter().map(|i| items[i].clone()).collect()))
}

fn map_eval(args: &[JpValue<'_>], ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let expr = args[0].as_expression()?;
    let items = args[1].as_array()?;
    Ok(Value::Array(evaluate_keys(expr, items, ctx)?))
}

/// Strings reverse by grapheme cluster so combining sequences stay intact.
fn reverse_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match args[0].as_json()? {
        Value::String(s) => Ok(Value::String(s.graphemes(true).rev().collect())),
        Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
        other => Err(EvalError::type_error(format!(
            "reverse expects a string or an array, found {}",
            type_name(other)
        ))),
    }
}

fn to_array_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match args[0].as_json()? {
        Value::Array(items) => Ok(Value::Array(items.clone())),
        other => Ok(Value::Array(vec![other.clone()])),
    }
}

fn not_null_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    for arg in args {
        let value = arg.as_json()?;
        if !value.is_null() {
            return Ok(value.clone());
        }
    }
    Ok(Value::Null)
}

pub fn functions() -> Vec<Arc<FunctionDefinition>> {
    vec![
        Arc::new(FunctionDefinition {
            name: "map",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: map_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "max",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: max_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "max_by",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: max_by_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "min",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: min_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "min_by",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: min_by_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "not_null",
            aliases: &[],
            arity: Arity::Variadic(1),
            eval_fn: not_null_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "reverse",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: reverse_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "sort",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: sort_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "sort_by",
            aliases: &[],
            arity: Arity::Fixed(2),
            eval_fn: sort_by_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "to_array",
            aliases: &[],
            arity: Arity::Fixed(1),
            eval_fn: to_array_eval,
        }),
    ]
}
