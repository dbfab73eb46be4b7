//! Operator tables: binding powers and operator semantics.

use crate::error::EvalError;
use crate::value::{compare, is_truthy, json_equal, type_name};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Binding power below which a projection stops absorbing the tokens that
/// follow it.
pub const PROJECTION_STOP: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl BinaryOperator {
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 2,
            BinaryOperator::And => 3,
            _ => 5,
        }
    }

    /// Applies a comparison. `&&`/`||` short-circuit in the interpreter and
    /// only reach this with both operands already evaluated.
    pub fn apply(self, lhs: &Value, rhs: &Value) -> Value {
        match self {
            BinaryOperator::Or => {
                if is_truthy(lhs) {
                    lhs.clone()
                } else {
                    rhs.clone()
                }
            }
            BinaryOperator::And => {
                if is_truthy(lhs) {
                    rhs.clone()
                } else {
                    lhs.clone()
                }
            }
            BinaryOperator::Eq => Value::Bool(json_equal(lhs, rhs)),
            BinaryOperator::Ne => Value::Bool(!json_equal(lhs, rhs)),
            BinaryOperator::Lt => ordering(lhs, rhs, |o| o == Ordering::Less),
            BinaryOperator::Lte => ordering(lhs, rhs, |o| o != Ordering::Greater),
            BinaryOperator::Gt => ordering(lhs, rhs, |o| o == Ordering::Greater),
            BinaryOperator::Gte => ordering(lhs, rhs, |o| o != Ordering::Less),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Gte => ">=",
        })
    }
}

fn ordering(lhs: &Value, rhs: &Value, test: impl Fn(Ordering) -> bool) -> Value {
    match compare(lhs, rhs) {
        Some(o) => Value::Bool(test(o)),
        None => Value::Null,
    }
}

/// A regular expression compiled once at parse time.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: String,
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(RegexMatcher {
            pattern: pattern.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

impl PartialEq for RegexMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOperator {
    Not,
    Regex(RegexMatcher),
}

impl UnaryOperator {
    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOperator::Not => 45,
            UnaryOperator::Regex(_) => 5,
        }
    }

    pub fn apply(&self, operand: &Value) -> Result<Value, EvalError> {
        match self {
            UnaryOperator::Not => Ok(Value::Bool(!is_truthy(operand))),
            UnaryOperator::Regex(matcher) => match operand {
                Value::String(s) => Ok(Value::Bool(matcher.is_match(s))),
                other => Err(EvalError::type_error(format!(
                    "regex match expects a string, found {}",
                    type_name(other)
                ))),
            },
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "!"),
            UnaryOperator::Regex(m) => write!(f, "=~ '{}'", m.pattern()),
        }
    }
}
