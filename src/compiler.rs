//! The compiler (C3): lowers an [`ast::Block`] into a main [`Chunk`] plus a
//! table of user-defined function chunks.
//!
//! Split into `compiler::{regalloc, expr, stmt}` — one register allocator
//! module, and one module per AST category, each with its own `impl
//! Compiler` block.

mod expr;
mod regalloc;
mod stmt;

use indexmap::IndexMap;

use crate::ast::Block;
use crate::chunk::{Chunk, Opcode};
use crate::error::{CompileError, Result};
use regalloc::RegAlloc;

/// A user-defined function: its parameter names (for arity checks at call
/// time) and its compiled body.
#[derive(Debug, Clone)]
pub struct UserFunction {
  pub name: String,
  pub params: Vec<String>,
  pub chunk: Chunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  Main,
  Function,
}

/// A loop's back-patch bookkeeping.
/// `start = None` marks a `for` loop, whose `continue` target is the
/// increment step rather than the loop header, so `continue` sites are
/// deferred into `continue_sites` and patched once that address is known.
struct LoopCtx {
  start: Option<usize>,
  break_sites: Vec<usize>,
  continue_sites: Vec<usize>,
}

impl LoopCtx {
  fn with_header(start: usize) -> Self {
    Self {
      start: Some(start),
      break_sites: Vec::new(),
      continue_sites: Vec::new(),
    }
  }

  fn deferred() -> Self {
    Self {
      start: None,
      break_sites: Vec::new(),
      continue_sites: Vec::new(),
    }
  }
}

/// One mapping `identifier -> register index` per active scope level.
/// `push_scope` clones the innermost map so that the copy both inherits
/// every binding currently visible and can be mutated (re-bound or
/// extended) without affecting the enclosing scope.
type Scope = IndexMap<String, usize>;

pub struct Compiler {
  chunk: Chunk,
  regs: RegAlloc,
  scopes: Vec<Scope>,
  loops: Vec<LoopCtx>,
  user_functions: IndexMap<String, UserFunction>,
  mode: Mode,
}

/// Compile a top-level program into its main chunk and its table of
/// user-defined functions.
pub fn compile(program: &Block) -> Result<(Chunk, IndexMap<String, UserFunction>)> {
  let mut compiler = Compiler::new(Mode::Main, RegAlloc::new());
  compiler.compile_block_flat(program)?;
  compiler.chunk.write(Opcode::Halt, 0, 0, 0);
  compiler.chunk.reg_count = compiler.regs.reg_count();
  Ok((compiler.chunk, compiler.user_functions))
}

impl Compiler {
  fn new(mode: Mode, regs: RegAlloc) -> Self {
    Self {
      chunk: Chunk::new(),
      regs,
      scopes: vec![Scope::new()],
      loops: Vec::new(),
      user_functions: IndexMap::new(),
      mode,
    }
  }

  fn for_function(params: &[String]) -> Self {
    let mut compiler = Self::new(Mode::Function, RegAlloc::with_params(params.len()));
    let scope = compiler.scopes.last_mut().expect("at least one scope");
    for (i, name) in params.iter().enumerate() {
      scope.insert(name.clone(), i);
    }
    compiler
  }

  /// Compile the statements of a block directly into the current scope,
  /// without pushing a new one — used for the function/main body, which
  /// shares its base scope with its parameter bindings.
  fn compile_block_flat(&mut self, block: &Block) -> Result<()> {
    for stmt in &block.statements {
      self.compile_stmt(stmt)?;
    }
    Ok(())
  }

  fn push_scope(&mut self) {
    let top = self.scopes.last().expect("at least one scope").clone();
    self.scopes.push(top);
  }

  fn pop_scope(&mut self) {
    self.scopes.pop();
    assert!(!self.scopes.is_empty(), "popped the base scope");
  }

  fn resolve(&self, name: &str) -> Option<usize> {
    self.scopes.last().and_then(|s| s.get(name).copied())
  }

  fn bind(&mut self, name: &str, slot: usize) {
    self.scopes.last_mut().expect("at least one scope").insert(name.to_string(), slot);
  }

  fn pc(&self) -> usize {
    self.chunk.code.len()
  }

  fn patch_jump_result(&mut self, site: usize, target: usize) {
    self.chunk.code[site].result = target as i32;
  }

  fn patch_jump_arg1(&mut self, site: usize, target: usize) {
    self.chunk.code[site].arg1 = target as i32;
  }

  fn declare_function(&mut self, name: &str, params: &[String], body: &Block) -> Result<()> {
    if self.mode == Mode::Function {
      return Err(CompileError::new("cannot declare a function within a function").into());
    }
    if self.user_functions.contains_key(name) {
      return Err(CompileError::new(format!("function '{name}' is already declared")).into());
    }

    let mut sub = Compiler::for_function(params);
    sub.compile_block_flat(body)?;
    sub.chunk.reg_count = sub.regs.reg_count();

    self.user_functions.insert(
      name.to_string(),
      UserFunction {
        name: name.to_string(),
        params: params.to_vec(),
        chunk: sub.chunk,
      },
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexer::Lexer;
  use crate::parser;

  fn compile_src(src: &str) -> (Chunk, IndexMap<String, UserFunction>) {
    let tokens = Lexer::new(src).scan().unwrap();
    let program = parser::parse(tokens).unwrap();
    compile(&program).unwrap()
  }

  #[test]
  fn main_chunk_ends_with_a_single_halt() {
    let (chunk, _) = compile_src("let a = 1;");
    assert_eq!(chunk.code.last().unwrap().op, Opcode::Halt);
    assert_eq!(
      chunk.code.iter().filter(|i| i.op == Opcode::Halt).count(),
      1
    );
  }

  #[test]
  fn function_chunks_do_not_end_with_halt() {
    let (_, funcs) = compile_src("func f() { return 1; }");
    let f = &funcs["f"];
    assert!(f.chunk.code.iter().all(|i| i.op != Opcode::Halt));
  }

  #[test]
  fn block_scoped_binding_is_invisible_after_the_block() {
    let err = {
      let tokens = Lexer::new("{ let x = 1; } x;").scan().unwrap();
      let program = parser::parse(tokens).unwrap();
      compile(&program)
    };
    assert!(err.is_err());
  }

  #[test]
  fn redeclaring_a_function_is_a_compile_error() {
    let tokens = Lexer::new("func f() { } func f() { }").scan().unwrap();
    let program = parser::parse(tokens).unwrap();
    assert!(compile(&program).is_err());
  }

  #[test]
  fn nested_function_declaration_is_a_compile_error() {
    let tokens = Lexer::new("func f() { func g() { } }").scan().unwrap();
    let program = parser::parse(tokens).unwrap();
    assert!(compile(&program).is_err());
  }

  #[test]
  fn undefined_variable_reference_is_a_compile_error() {
    let tokens = Lexer::new("print(x);").scan().unwrap();
    let program = parser::parse(tokens).unwrap();
    assert!(compile(&program).is_err());
  }
}
