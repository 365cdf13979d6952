//! Statement lowering.
//!
//! The one asymmetry worth flagging: `compile_if_stmt`'s `JUMP_IF_FALSE`
//! patches its own `result` slot to the fall-through address, while the
//! `JUMP` that skips the `else` branch patches its `arg1` slot instead.
//! Both opcodes carry a jump target, just in different slots depending on
//! which one emits them.

use crate::ast::{Block, Expr, Stmt};
use crate::chunk::Opcode;
use crate::error::{CompileError, Result};

use super::{Compiler, LoopCtx, Mode};

impl Compiler {
  pub(super) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<()> {
    match stmt {
      Stmt::Let { name, initializer } => self.compile_let_stmt(name, initializer),
      Stmt::If {
        condition,
        then_branch,
        else_branch,
      } => self.compile_if_stmt(condition, then_branch, else_branch.as_ref()),
      Stmt::While { condition, body } => self.compile_while_stmt(condition, body),
      Stmt::For {
        initializer,
        condition,
        increment,
        body,
      } => self.compile_for_stmt(initializer.as_deref(), condition.as_ref(), increment.as_ref(), body),
      Stmt::Func { name, params, body } => self.declare_function(name, params, body),
      Stmt::Return(value) => self.compile_return_stmt(value),
      Stmt::Break => self.compile_break_stmt(),
      Stmt::Continue => self.compile_continue_stmt(),
      Stmt::Expr(expr) => {
        self.compile_expr(expr)?;
        Ok(())
      }
      Stmt::Block(block) => {
        self.push_scope();
        self.compile_block_flat(block)?;
        self.pop_scope();
        Ok(())
      }
    }
  }

  fn compile_let_stmt(&mut self, name: &str, initializer: &Option<Expr>) -> Result<()> {
    let value_reg = match initializer {
      Some(expr) => self.compile_expr(expr)?,
      None => {
        let idx = self.chunk.add_const_number(0.0);
        let reg = self.regs.alloc();
        self.chunk.write(Opcode::Constant, idx as i32, 0, reg.index());
        reg
      }
    };
    // REGISTER_LOCAL marks the register as a named binding rather than a
    // transient temporary; it does not move the value anywhere new.
    self
      .chunk
      .write(Opcode::RegisterLocal, value_reg.index(), 0, value_reg.index());
    self.bind(name, value_reg.0);
    Ok(())
  }

  fn compile_if_stmt(&mut self, condition: &Expr, then_branch: &Block, else_branch: Option<&Block>) -> Result<()> {
    let cond_reg = self.compile_expr(condition)?;
    let jump_if_false_site = self.pc();
    self.chunk.write(Opcode::JumpIfFalse, cond_reg.index(), 0, 0);

    self.push_scope();
    self.compile_block_flat(then_branch)?;
    self.pop_scope();

    match else_branch {
      Some(else_branch) => {
        let jump_site = self.pc();
        self.chunk.write(Opcode::Jump, 0, 0, 0);

        let else_start = self.pc();
        self.patch_jump_result(jump_if_false_site, else_start);

        self.push_scope();
        self.compile_block_flat(else_branch)?;
        self.pop_scope();

        let after = self.pc();
        self.patch_jump_arg1(jump_site, after);
      }
      None => {
        let after = self.pc();
        self.patch_jump_result(jump_if_false_site, after);
      }
    }
    Ok(())
  }

  fn compile_while_stmt(&mut self, condition: &Expr, body: &Block) -> Result<()> {
    let loop_start = self.pc();
    let cond_reg = self.compile_expr(condition)?;
    let jump_if_false_site = self.pc();
    self.chunk.write(Opcode::JumpIfFalse, cond_reg.index(), 0, 0);

    self.loops.push(LoopCtx::with_header(loop_start));
    let mark = self.regs.mark();
    self.push_scope();
    self.compile_block_flat(body)?;
    self.pop_scope();
    self.regs.rewind(mark);

    self.chunk.write(Opcode::Jump, loop_start as i32, 0, 0);
    let after = self.pc();
    self.patch_jump_result(jump_if_false_site, after);

    let loop_ctx = self.loops.pop().expect("pushed above");
    for site in loop_ctx.break_sites {
      self.patch_jump_arg1(site, after);
    }
    for site in loop_ctx.continue_sites {
      self.patch_jump_arg1(site, loop_start);
    }
    Ok(())
  }

  fn compile_for_stmt(
    &mut self,
    initializer: Option<&Stmt>,
    condition: Option<&Expr>,
    increment: Option<&Expr>,
    body: &Block,
  ) -> Result<()> {
    if let Some(init) = initializer {
      self.compile_stmt(init)?;
    }

    let loop_start = self.pc();
    let jump_if_false_site = match condition {
      Some(cond) => {
        let cond_reg = self.compile_expr(cond)?;
        let site = self.pc();
        self.chunk.write(Opcode::JumpIfFalse, cond_reg.index(), 0, 0);
        Some(site)
      }
      None => None,
    };

    // A `for` loop's `continue` must run the increment step before
    // re-checking the condition, but that step is compiled *after* the
    // body, so its address isn't known yet — continue sites are collected
    // and patched once `increment_start` is.
    self.loops.push(LoopCtx::deferred());
    let mark = self.regs.mark();
    self.push_scope();
    self.compile_block_flat(body)?;
    self.pop_scope();
    self.regs.rewind(mark);

    let increment_start = self.pc();
    if let Some(inc) = increment {
      self.compile_expr(inc)?;
    }

    self.chunk.write(Opcode::Jump, loop_start as i32, 0, 0);
    let after = self.pc();
    if let Some(site) = jump_if_false_site {
      self.patch_jump_result(site, after);
    }

    let loop_ctx = self.loops.pop().expect("pushed above");
    for site in loop_ctx.break_sites {
      self.patch_jump_arg1(site, after);
    }
    for site in loop_ctx.continue_sites {
      self.patch_jump_arg1(site, increment_start);
    }

    Ok(())
  }

  fn compile_return_stmt(&mut self, value: &Option<Expr>) -> Result<()> {
    if self.mode != Mode::Function {
      return Err(CompileError::new("'return' outside of a function").into());
    }
    let reg = match value {
      Some(expr) => self.compile_expr(expr)?,
      None => {
        let idx = self.chunk.add_const_number(0.0);
        let reg = self.regs.alloc();
        self.chunk.write(Opcode::Constant, idx as i32, 0, reg.index());
        reg
      }
    };
    self.chunk.write(Opcode::ReturnVal, reg.index(), 0, 0);
    Ok(())
  }

  fn compile_break_stmt(&mut self) -> Result<()> {
    if self.loops.is_empty() {
      return Err(CompileError::new("'break' outside of a loop").into());
    }
    let site = self.pc();
    self.chunk.write(Opcode::Jump, 0, 0, 0);
    self.loops.last_mut().expect("checked not empty above").break_sites.push(site);
    Ok(())
  }

  fn compile_continue_stmt(&mut self) -> Result<()> {
    if self.loops.is_empty() {
      return Err(CompileError::new("'continue' outside of a loop").into());
    }
    let start = self.loops.last().expect("checked not empty above").start;
    match start {
      Some(start) => {
        self.chunk.write(Opcode::Jump, start as i32, 0, 0);
      }
      None => {
        let site = self.pc();
        self.chunk.write(Opcode::Jump, 0, 0, 0);
        self.loops.last_mut().expect("checked not empty above").continue_sites.push(site);
      }
    }
    Ok(())
  }
}
