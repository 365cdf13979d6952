//! Host functions callable from MiniLang source: `print`, `input`, and
//! `str2int`.

use std::io::{BufRead, Write};

use crate::error::{Result, RuntimeError};
use crate::value::Value;

fn io_err(e: std::io::Error) -> crate::error::Error {
  RuntimeError::new(format!("I/O error: {e}")).into()
}

/// Zero arguments prints just a newline; one argument prints its display
/// form followed by a newline. Either way the call itself evaluates to `0`.
pub fn print(args: &[Value], out: &mut dyn Write) -> Result<Value> {
  match args {
    [] => writeln!(out).map_err(io_err)?,
    [value] => writeln!(out, "{value}").map_err(io_err)?,
    _ => return Err(RuntimeError::new("'print' takes at most one argument").into()),
  }
  Ok(Value::Number(0.0))
}

/// Writes its one argument as a prompt with no trailing newline, flushes,
/// and reads one line of input. End of input yields the empty string.
pub fn input(args: &[Value], out: &mut dyn Write, input: &mut dyn BufRead) -> Result<Value> {
  let [prompt] = args else {
    return Err(RuntimeError::new("'input' takes exactly one argument").into());
  };
  write!(out, "{prompt}").map_err(io_err)?;
  out.flush().map_err(io_err)?;

  let mut line = String::new();
  let read = input.read_line(&mut line).map_err(io_err)?;
  if read == 0 {
    return Ok(Value::string(""));
  }
  if line.ends_with('\n') {
    line.pop();
    if line.ends_with('\r') {
      line.pop();
    }
  }
  Ok(Value::string(line))
}

/// Parses its one string argument as a number. Leading whitespace is
/// skipped; anything left over after the number is a runtime error rather
/// than being silently ignored.
pub fn str2int(args: &[Value]) -> Result<Value> {
  let [value] = args else {
    return Err(RuntimeError::new("'str2int' takes exactly one argument").into());
  };
  let s = value
    .as_str()
    .ok_or_else(|| RuntimeError::new("'str2int' requires a string argument"))?;

  s.trim_start()
    .parse::<f64>()
    .map(Value::Number)
    .map_err(|_| RuntimeError::new(format!("'{s}' is not a valid number")).into())
}
