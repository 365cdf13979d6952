//! Expression lowering.
//!
//! Every `Expr` variant lowers to one or more instructions and leaves its
//! value in a freshly allocated register, which the caller reads back by
//! index.

use crate::ast::{BinOp, Expr, UnOp};
use crate::chunk::Opcode;
use crate::error::{CompileError, Result};

use super::regalloc::Register;
use super::Compiler;

impl Compiler {
  pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<Register> {
    match expr {
      Expr::Number(n) => self.compile_number(*n),
      Expr::Str(s) => self.compile_string(s),
      Expr::Variable(name) => self.compile_variable(name),
      Expr::Binary { op, left, right } => self.compile_binary_expr(*op, left, right),
      Expr::Unary { op, right } => self.compile_unary_expr(*op, right),
      Expr::Call { callee, arguments } => self.compile_call_expr(callee, arguments),
      Expr::Assign { name, value } => self.compile_assign_expr(name, value),
    }
  }

  fn compile_number(&mut self, n: f64) -> Result<Register> {
    let idx = self.chunk.add_const_number(n);
    let dst = self.regs.alloc();
    self.chunk.write(Opcode::Constant, idx as i32, 0, dst.index());
    Ok(dst)
  }

  fn compile_string(&mut self, s: &str) -> Result<Register> {
    let idx = self.chunk.add_const_str(s);
    let dst = self.regs.alloc();
    // One's-complement index marks a CONSTANT as pointing into the string
    // pool rather than the number pool.
    self.chunk.write(Opcode::Constant, !(idx as i32), 0, dst.index());
    Ok(dst)
  }

  fn compile_variable(&mut self, name: &str) -> Result<Register> {
    let src = self
      .resolve(name)
      .ok_or_else(|| CompileError::new(format!("undefined variable '{name}'")))?;
    let dst = self.regs.alloc();
    self.chunk.write(Opcode::GetLocal, src as i32, 0, dst.index());
    Ok(dst)
  }

  fn compile_binary_expr(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Register> {
    let left_reg = self.compile_expr(left)?;
    let right_reg = self.compile_expr(right)?;

    let opcode = match op {
      BinOp::Add => Opcode::Add,
      BinOp::Sub => Opcode::Sub,
      BinOp::Mul => Opcode::Mul,
      BinOp::Div => Opcode::Div,
      BinOp::Equal | BinOp::NotEqual => Opcode::Equal,
      BinOp::Less => Opcode::Less,
      BinOp::LessEqual => Opcode::LessEqual,
      BinOp::Greater => Opcode::Greater,
      BinOp::GreaterEqual => Opcode::GreaterEqual,
    };
    let eq_reg = self.emit_binop(opcode, left_reg, right_reg);

    if op != BinOp::NotEqual {
      return Ok(eq_reg);
    }

    // `!=` lowers as `EQUAL` followed by `NOT`, reproduced bit-for-bit from
    // the original, off-by-one included: the register this function returns
    // is allocated *after* `NOT`'s destination and is never written by it.
    // Any later read of a `!=` result observes whatever was already sitting
    // in that register, not the negated comparison.
    let not_reg = self.regs.alloc();
    self.chunk.write(Opcode::Not, eq_reg.index(), 0, not_reg.index());
    let result_reg = self.regs.alloc();
    Ok(result_reg)
  }

  fn emit_binop(&mut self, op: Opcode, left: Register, right: Register) -> Register {
    let dst = self.regs.alloc();
    self.chunk.write(op, left.index(), right.index(), dst.index());
    dst
  }

  fn compile_unary_expr(&mut self, op: UnOp, right: &Expr) -> Result<Register> {
    match op {
      UnOp::Not => {
        let right_reg = self.compile_expr(right)?;
        let dst = self.regs.alloc();
        self.chunk.write(Opcode::Not, right_reg.index(), 0, dst.index());
        Ok(dst)
      }
      UnOp::Neg => {
        // No dedicated NEGATE opcode: a unary minus synthesizes a zero
        // constant and lowers to `SUB 0, right`.
        let right_reg = self.compile_expr(right)?;
        let zero_idx = self.chunk.add_const_number(0.0);
        let zero_reg = self.regs.alloc();
        self
          .chunk
          .write(Opcode::Constant, zero_idx as i32, 0, zero_reg.index());
        let dst = self.regs.alloc();
        self
          .chunk
          .write(Opcode::Sub, zero_reg.index(), right_reg.index(), dst.index());
        Ok(dst)
      }
    }
  }

  /// Call ABI: the callee's name is loaded as a string
  /// constant into its own register, each argument is evaluated and then
  /// copied with `SET_LOCAL` into a window of registers immediately below
  /// the call's result register, and `CALL` reads that window by arity.
  fn compile_call_expr(&mut self, callee: &str, arguments: &[Expr]) -> Result<Register> {
    let name_idx = self.chunk.add_const_str(callee);
    let fn_reg = self.regs.alloc();
    self
      .chunk
      .write(Opcode::Constant, !(name_idx as i32), 0, fn_reg.index());

    let mut arg_regs = Vec::with_capacity(arguments.len());
    for arg in arguments {
      arg_regs.push(self.compile_expr(arg)?);
    }

    let mut window = Vec::with_capacity(arguments.len());
    for arg_reg in &arg_regs {
      let slot = self.regs.alloc();
      self
        .chunk
        .write(Opcode::SetLocal, arg_reg.index(), 0, slot.index());
      window.push(slot);
    }

    let result = self.regs.alloc();
    self.chunk.write(
      Opcode::Call,
      fn_reg.index(),
      arguments.len() as i32,
      result.index(),
    );
    Ok(result)
  }

  pub(super) fn compile_assign_expr(&mut self, name: &str, value: &Expr) -> Result<Register> {
    let value_reg = self.compile_expr(value)?;
    let dst = self
      .resolve(name)
      .ok_or_else(|| CompileError::new(format!("undefined variable '{name}'")))?;
    self.chunk.write(Opcode::SetLocal, value_reg.index(), 0, dst as i32);
    Ok(Register(dst))
  }
}
