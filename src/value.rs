//! The runtime value model (C2).
//!
//! A plain Rust `enum` replaces the raw C++ union this language's values
//! were originally stored in (which manually placement-constructs and
//! destructs its `std::string` arm, and is undefined behavior without
//! exactly that care): no manual drop glue, no invalid state representable
//! at all. String payloads are `Rc<str>` rather than `String` so that
//! copying a value (the VM copies values between registers constantly) is a
//! cheap refcount bump instead of a fresh heap allocation — there is no
//! garbage collector, so values stay simple and copyable.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Number(f64),
  String(Rc<str>),
}

impl Value {
  pub fn string(s: impl Into<Rc<str>>) -> Self {
    Value::String(s.into())
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      Value::String(_) => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      Value::Number(_) => None,
    }
  }

  /// False iff the value is the number `0.0`, true for every other number
  /// and for every string. This is the VM's condition for `JUMP_IF_FALSE`,
  /// distinct from `OP_NOT`'s truthiness, which treats all strings as false
  /// (see `vm::ops::not`).
  pub fn is_falsy(&self) -> bool {
    matches!(self, Value::Number(n) if *n == 0.0)
  }
}

impl Default for Value {
  fn default() -> Self {
    Value::Number(0.0)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Number(n) => write!(f, "{n}"),
      Value::String(s) => write!(f, "{s}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_value_is_number_zero() {
    assert_eq!(Value::default(), Value::Number(0.0));
  }

  #[test]
  fn only_numeric_zero_is_falsy() {
    assert!(Value::Number(0.0).is_falsy());
    assert!(!Value::Number(1.0).is_falsy());
    assert!(!Value::string("").is_falsy());
    assert!(!Value::string("0").is_falsy());
  }

  #[test]
  fn cloning_a_string_value_is_a_cheap_handle_copy() {
    let a = Value::string("hello");
    let b = a.clone();
    assert_eq!(a, b);
    if let (Value::String(a), Value::String(b)) = (&a, &b) {
      assert!(Rc::ptr_eq(a, b));
    } else {
      panic!("expected string values");
    }
  }
}
