//! The evaluator's value model.

use crate::ast::Ast;
use crate::error::EvalError;
use crate::number;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// A value flowing through function arguments: either a JSON value or an
/// unevaluated sub-expression (`&expr`).
#[derive(Debug, Clone, PartialEq)]
pub enum JpValue<'a> {
    Json(Value),
    Expression(&'a Ast),
}

impl<'a> JpValue<'a> {
    pub fn as_json(&self) -> Result<&Value, EvalError> {
        match self {
            JpValue::Json(v) => Ok(v),
            JpValue::Expression(_) => Err(mismatch("a JSON value", self)),
        }
    }

    pub fn as_expression(&self) -> Result<&'a Ast, EvalError> {
        match self {
            JpValue::Expression(ast) => Ok(*ast),
            JpValue::Json(_) => Err(mismatch("expression", self)),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Value>, EvalError> {
        match self {
            JpValue::Json(Value::Array(a)) => Ok(a),
            _ => Err(mismatch("array", self)),
        }
    }

    pub fn as_object(&self) -> Result<&Map<String, Value>, EvalError> {
        match self {
            JpValue::Json(Value::Object(o)) => Ok(o),
            _ => Err(mismatch("object", self)),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            JpValue::Json(Value::String(s)) => Ok(s),
            _ => Err(mismatch("string", self)),
        }
    }

    pub fn as_number(&self) -> Result<&Number, EvalError> {
        match self {
            JpValue::Json(Value::Number(n)) => Ok(n),
            _ => Err(mismatch("number", self)),
        }
    }

    /// `None` for expression references, which have no JMESPath type name.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            JpValue::Json(v) => Some(type_name(v)),
            JpValue::Expression(_) => None,
        }
    }
}

fn mismatch(expected: &str, actual: &JpValue<'_>) -> EvalError {
    EvalError::type_error(format!(
        "expected {expected}, found {}",
        actual.type_name().unwrap_or("expression")
    ))
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JMESPath truthiness. Every number, including zero, is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Structural equality. Numbers compare by value (`1 == 1.0`) and object key
/// order is ignored.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => number::equals(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => false,
    }
}

/// Ordinal comparison over UTF-16 code units.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Ordering for two numbers or two strings; `None` for any other pairing.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number::compare(x, y),
        (Value::String(x), Value::String(y)) => Some(compare_strings(x, y)),
        _ => None,
    }
}
