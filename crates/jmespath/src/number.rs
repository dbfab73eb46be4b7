//! Numeric helpers.
//!
//! Every arithmetic operation first tries exact decimal arithmetic and falls
//! back to `f64` only when a value (or an intermediate result) cannot be
//! represented as a [`Decimal`].

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::str::FromStr;

/// Exact decimal view of a JSON number, if it has one.
pub fn to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    n.as_f64().and_then(Decimal::from_f64)
}

pub fn to_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// Integral decimals that fit `i64` or `u64` become JSON integers.
pub fn decimal_to_value(d: Decimal) -> Value {
    let d = d.normalize();
    if d.scale() == 0 {
        if let Some(i) = d.to_i64() {
            return Value::Number(Number::from(i));
        }
        if let Some(u) = d.to_u64() {
            return Value::Number(Number::from(u));
        }
    }
    match d.to_f64() {
        Some(f) => f64_to_value(f),
        None => Value::Null,
    }
}

/// NaN and infinities have no JSON form and become `null`.
pub fn f64_to_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

pub fn compare(a: &Number, b: &Number) -> Option<Ordering> {
    match (to_decimal(a), to_decimal(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => to_f64(a).partial_cmp(&to_f64(b)),
    }
}

pub fn equals(a: &Number, b: &Number) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

pub fn abs(n: &Number) -> Value {
    match to_decimal(n) {
        Some(d) => decimal_to_value(d.abs()),
        None => f64_to_value(to_f64(n).abs()),
    }
}

pub fn ceil(n: &Number) -> Value {
    match to_decimal(n) {
        Some(d) => decimal_to_value(d.ceil()),
        None => f64_to_value(to_f64(n).ceil()),
    }
}

pub fn floor(n: &Number) -> Value {
    match to_decimal(n) {
        Some(d) => decimal_to_value(d.floor()),
        None => f64_to_value(to_f64(n).floor()),
    }
}

fn decimal_sum(nums: &[&Number]) -> Option<Decimal> {
    nums.iter().try_fold(Decimal::ZERO, |acc, n| acc.checked_add(to_decimal(n)?))
}

fn double_sum(nums: &[&Number]) -> f64 {
    nums.iter().map(|n| to_f64(n)).sum()
}

pub fn sum(nums: &[&Number]) -> Value {
    match decimal_sum(nums) {
        Some(d) => decimal_to_value(d),
        None => f64_to_value(double_sum(nums)),
    }
}

/// Mean of a non-empty slice. Callers reject empty input.
pub fn avg(nums: &[&Number]) -> Value {
    let count = nums.len();
    let exact = decimal_sum(nums).and_then(|total| total.checked_div(Decimal::from(count)));
    match exact {
        Some(d) => decimal_to_value(d),
        None => f64_to_value(double_sum(nums) / count as f64),
    }
}

/// Parses numeric text: plain decimal, then scientific notation, then `f64`.
///
/// Accounting forms are accepted too: `,` group separators, a negative
/// amount in parentheses like `(5)`, and a trailing sign like `5-`.
pub fn parse(text: &str) -> Option<Value> {
    let text = canonical_sign(text.trim())?;
    let text = text.as_str();
    if let Ok(d) = Decimal::from_str(text) {
        return Some(decimal_to_value(d));
    }
    if let Ok(d) = Decimal::from_scientific(text) {
        return Some(decimal_to_value(d));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f64_to_value(f)),
        _ => None,
    }
}

/// Rewrites `text` with at most one sign, placed in front, and without group
/// separators. A number may carry only one of the sign forms.
fn canonical_sign(text: &str) -> Option<String> {
    let parenthesized = text.strip_prefix('(').and_then(|t| t.strip_suffix(')'));
    let (body, sign) = if let Some(inner) = parenthesized {
        (inner.trim(), Some('-'))
    } else if let Some(inner) = text.strip_suffix('-') {
        (inner.trim_end(), Some('-'))
    } else if let Some(inner) = text.strip_suffix('+') {
        (inner.trim_end(), Some('+'))
    } else {
        (text, None)
    };
    if sign.is_some() && body.starts_with(['+', '-']) {
        return None;
    }
    let digits: String = body.chars().filter(|&c| c != ',').collect();
    if digits.is_empty() || digits.ends_with(['e', 'E']) {
        return None;
    }
    Some(match sign {
        Some('-') => format!("-{digits}"),
        _ => digits,
    })
}
