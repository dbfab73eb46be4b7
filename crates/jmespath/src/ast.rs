//! Expression tree.

use crate::error::EvalError;
use crate::operators::{BinaryOperator, UnaryOperator};
use serde_json::Value;

/// A compiled JMESPath node.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// `@`
    CurrentNode,
    /// `foo`, `"foo"`
    Identifier(String),
    /// `[2]`, `[-1]`
    Index(i64),
    /// `` `{"a": 1}` ``, `'raw'`
    Literal(Value),
    /// `lhs.rhs`
    Subexpr(Box<Ast>, Box<Ast>),
    /// `lhs | rhs`
    Pipe(Box<Ast>, Box<Ast>),
    /// Evaluates `lhs`, then maps `rhs` over the elements the projection
    /// selects from it.
    Projection {
        kind: Projection,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    /// `[a, b]`
    MultiSelectList(Vec<Ast>),
    /// `{a: x, b: y}`
    MultiSelectHash(Vec<KeyValuePair>),
    /// `name(args...)`
    Function { name: String, args: Vec<Ast> },
    /// `&expr`
    ExpressionRef(Box<Ast>),
    Binary {
        op: BinaryOperator,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Ast>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValuePair {
    pub key: String,
    pub value: Ast,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*` and `.*`, projecting over object values.
    Object,
    /// `[*]`
    List,
    /// `[]`
    Flatten,
    /// `[start:stop:step]`
    Slice(Slice),
    /// `[?predicate]`
    Filter(Box<Ast>),
}

impl Ast {
    pub fn subexpr(lhs: Ast, rhs: Ast) -> Ast {
        Ast::Subexpr(Box::new(lhs), Box::new(rhs))
    }

    pub fn pipe(lhs: Ast, rhs: Ast) -> Ast {
        Ast::Pipe(Box::new(lhs), Box::new(rhs))
    }

    pub fn projection(kind: Projection, lhs: Ast, rhs: Ast) -> Ast {
        Ast::Projection {
            kind,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn binary(op: BinaryOperator, lhs: Ast, rhs: Ast) -> Ast {
        Ast::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Ast) -> Ast {
        Ast::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

/// Python-style array slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: i64,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Slice {
            start,
            stop,
            step: step.unwrap_or(1),
        }
    }

    /// Indices selected from an array of length `len`, in selection order.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>, EvalError> {
        let step = self.step;
        if step == 0 {
            return Err(EvalError::InvalidSlice);
        }
        let len = len as i64;
        let start = match self.start {
            Some(s) => adjust_endpoint(s, len, step),
            None if step < 0 => len - 1,
            None => 0,
        };
        let stop = match self.stop {
            Some(s) => adjust_endpoint(s, len, step),
            None if step < 0 => -1,
            None => len,
        };

        let mut out = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(out)
    }
}

fn adjust_endpoint(endpoint: i64, len: i64, step: i64) -> i64 {
    if endpoint < 0 {
        let adjusted = endpoint.saturating_add(len);
        if adjusted >= 0 {
            adjusted
        } else if step < 0 {
            -1
        } else {
            0
        }
    } else if endpoint >= len {
        if step < 0 {
            len - 1
        } else {
            len
        }
    } else {
        endpoint
    }
}
