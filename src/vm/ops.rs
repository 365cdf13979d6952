//! Arithmetic, comparison, and logical-negation semantics for [`Value`]s.
//!
//! Arithmetic and comparison live as free functions taking operands by
//! reference and returning a `Result<Value>`, kept separate from the
//! dispatch loop that calls them.

use crate::error::{Result, RuntimeError};
use crate::value::Value;

fn numeric_pair(op: &str, a: &Value, b: &Value) -> Result<(f64, f64)> {
  match (a.as_number(), b.as_number()) {
    (Some(a), Some(b)) => Ok((a, b)),
    _ => Err(RuntimeError::new(format!("'{op}' requires two numbers")).into()),
  }
}

pub fn add(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair("+", a, b)?;
  Ok(Value::Number(a + b))
}

pub fn sub(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair("-", a, b)?;
  Ok(Value::Number(a - b))
}

pub fn mul(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair("*", a, b)?;
  Ok(Value::Number(a * b))
}

pub fn div(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair("/", a, b)?;
  if b == 0.0 {
    return Err(RuntimeError::new("division by zero").into());
  }
  Ok(Value::Number(a / b))
}

/// Cross-type comparisons are simply unequal rather than an error, so
/// `EQUAL` is total over every pair of values.
pub fn equal(a: &Value, b: &Value) -> Result<Value> {
  let eq = match (a, b) {
    (Value::Number(a), Value::Number(b)) => a == b,
    (Value::String(a), Value::String(b)) => a == b,
    _ => false,
  };
  Ok(Value::Number(if eq { 1.0 } else { 0.0 }))
}

pub fn greater(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair(">", a, b)?;
  Ok(Value::Number(if a > b { 1.0 } else { 0.0 }))
}

pub fn less(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair("<", a, b)?;
  Ok(Value::Number(if a < b { 1.0 } else { 0.0 }))
}

pub fn greater_equal(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair(">=", a, b)?;
  Ok(Value::Number(if a >= b { 1.0 } else { 0.0 }))
}

pub fn less_equal(a: &Value, b: &Value) -> Result<Value> {
  let (a, b) = numeric_pair("<=", a, b)?;
  Ok(Value::Number(if a <= b { 1.0 } else { 0.0 }))
}

/// `NOT`'s own truthiness, distinct from [`Value::is_falsy`]: every string is
/// treated as false here, not just the ones `is_falsy` would already call
/// falsy (which is none of them). `!"anything"` therefore evaluates to `1`,
/// the same as `!""`.
pub fn not(v: &Value) -> Value {
  let truthy = match v {
    Value::Number(n) => *n != 0.0,
    Value::String(_) => false,
  };
  Value::Number(if truthy { 0.0 } else { 1.0 })
}
