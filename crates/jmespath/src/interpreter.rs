//! Tree-walking evaluator.

use crate::ast::{Ast, Projection};
use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::operators::BinaryOperator;
use crate::types::check_arity;
use crate::value::{is_truthy, JpValue};
use serde_json::{Map, Value};

/// Evaluates `node` with `current` as the current node (`@`).
///
/// Data-shape mismatches yield `null`. Soft errors that do occur propagate
/// to the caller, except those raised inside a function body, which become
/// `null` at the call site.
pub fn interpret(node: &Ast, current: &Value, ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match node {
        Ast::CurrentNode => Ok(current.clone()),
        Ast::Identifier(name) => Ok(match current {
            Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        Ast::Index(index) => Ok(match current {
            Value::Array(items) => resolve_index(items, *index).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        Ast::Literal(value) => Ok(value.clone()),
        Ast::Subexpr(lhs, rhs) | Ast::Pipe(lhs, rhs) => {
            let left = interpret(lhs, current, ctx)?;
            interpret(rhs, &left, ctx)
        }
        Ast::Projection { kind, lhs, rhs } => {
            let left = interpret(lhs, current, ctx)?;
            match select(kind, left, ctx)? {
                Some(elements) => project(elements, rhs, ctx),
                None => Ok(Value::Null),
            }
        }
        Ast::MultiSelectList(items) => {
            if current.is_null() {
                return Ok(Value::Null);
            }
            let values = items
                .iter()
                .map(|item| interpret(item, current, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        Ast::MultiSelectHash(pairs) => {
            if current.is_null() {
                return Ok(Value::Null);
            }
            let mut map = Map::new();
            for pair in pairs {
                map.insert(pair.key.clone(), interpret(&pair.value, current, ctx)?);
            }
            Ok(Value::Object(map))
        }
        Ast::Function { name, args } => call_function(name, args, current, ctx),
        Ast::ExpressionRef(_) => Err(EvalError::ExpressionRef),
        Ast::Binary { op, lhs, rhs } => {
            let left = interpret(lhs, current, ctx)?;
            match op {
                BinaryOperator::Or if is_truthy(&left) => Ok(left),
                BinaryOperator::And if !is_truthy(&left) => Ok(left),
                BinaryOperator::Or | BinaryOperator::And => interpret(rhs, current, ctx),
                _ => {
                    let right = interpret(rhs, current, ctx)?;
                    Ok(op.apply(&left, &right))
                }
            }
        }
        Ast::Unary { op, operand } => op.apply(&interpret(operand, current, ctx)?),
    }
}

fn resolve_index(items: &[Value], index: i64) -> Option<&Value> {
    let resolved = if index < 0 {
        (items.len() as i64).checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().and_then(|i| items.get(i))
}

/// The elements a projection iterates, or `None` when the left side has the
/// wrong container type.
fn select(
    kind: &Projection,
    left: Value,
    ctx: &EvalCtx<'_>,
) -> Result<Option<Vec<Value>>, EvalError> {
    let elements = match (kind, left) {
        (Projection::Object, Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
        (Projection::List, Value::Array(items)) => items,
        (Projection::Flatten, Value::Array(items)) => {
            let mut flat = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            flat
        }
        (Projection::Slice(slice), Value::Array(items)) => slice
            .indices(items.len())?
            .into_iter()
            .map(|i| items[i].clone())
            .collect(),
        (Projection::Filter(predicate), Value::Array(items)) => {
            let mut kept = Vec::new();
            for item in items {
                if item.is_null() {
                    continue;
                }
                if is_truthy(&interpret(predicate, &item, ctx)?) {
                    kept.push(item);
                }
            }
            kept
        }
        _ => return Ok(None),
    };
    Ok(Some(elements))
}

/// Applies `rhs` to every non-null element, dropping null results. The first
/// failure aborts the whole projection.
fn project(elements: Vec<Value>, rhs: &Ast, ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements.iter().filter(|e| !e.is_null()) {
        let value = interpret(rhs, element, ctx)?;
        if !value.is_null() {
            out.push(value);
        }
    }
    Ok(Value::Array(out))
}

fn call_function(
    name: &str,
    args: &[Ast],
    current: &Value,
    ctx: &EvalCtx<'_>,
) -> Result<Value, EvalError> {
    let def = ctx
        .function(name)
        .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    check_arity(name, def.arity, args.len()).map_err(EvalError::Arity)?;

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Ast::ExpressionRef(inner) => values.push(JpValue::Expression(inner)),
            other => values.push(JpValue::Json(interpret(other, current, ctx)?)),
        }
    }

    match (def.eval_fn)(&values, ctx) {
        Err(e) if !e.is_hard() => {
            log::debug!("function {name}() failed, yielding null: {e}");
            Ok(Value::Null)
        }
        result => result,
    }
}
