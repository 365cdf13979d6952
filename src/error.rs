//! Error types for every stage of the pipeline: scan, parse, compile, run.
//!
//! Each stage has its own error type; [`Error`] wraps whichever one fired so
//! that callers of [`crate::compile`] / [`crate::run`] only need to deal with
//! a single type. Nothing in this crate panics or calls `process::exit` on a
//! user-facing error — that is the driver binary's job.

use crate::token::Span;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Lex(#[from] LexError),
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error(transparent)]
  Compile(#[from] CompileError),
  #[error(transparent)]
  Runtime(#[from] RuntimeError),
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
  pub message: String,
  pub span: Span,
}

impl LexError {
  pub fn new(message: impl Into<String>, span: Span) -> Self {
    Self {
      message: message.into(),
      span,
    }
  }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
  pub message: String,
  pub span: Span,
}

impl ParseError {
  pub fn new(message: impl Into<String>, span: Span) -> Self {
    Self {
      message: message.into(),
      span,
    }
  }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
  pub message: String,
}

impl CompileError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
  pub message: String,
}

impl RuntimeError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}
