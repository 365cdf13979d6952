//! The virtual machine (C4): a register-file-per-frame bytecode interpreter.
//!
//! One `Frame` per active call, each owning its own register file. Calling
//! a function pushes a frame; returning pops it and writes the result into
//! the register the caller's `CALL` instruction named.

mod builtins;
mod ops;

use std::io::{BufRead, Write};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::chunk::{Chunk, Instruction, Opcode};
use crate::compiler::UserFunction;
use crate::error::{Result, RuntimeError};
use crate::value::Value;

/// call depth is bounded so that unbounded recursion fails
/// as a reported runtime error instead of exhausting the host stack.
pub const MAX_CALL_DEPTH: usize = 64;

struct Frame {
  /// `None` selects the main chunk; `Some(name)` a user function's chunk.
  chunk_name: Option<Rc<str>>,
  pc: usize,
  registers: Vec<Value>,
  /// The caller's register that this frame's `RETURN_VAL` will fill in.
  /// Unused (and never read) for the bottom, main-chunk frame.
  return_reg: usize,
}

pub struct Vm<'io> {
  main_chunk: Chunk,
  functions: IndexMap<Rc<str>, Rc<UserFunction>>,
  frames: Vec<Frame>,
  stdout: &'io mut dyn Write,
  stdin: &'io mut dyn BufRead,
}

impl<'io> Vm<'io> {
  pub fn new(
    main_chunk: Chunk,
    functions: IndexMap<String, UserFunction>,
    stdout: &'io mut dyn Write,
    stdin: &'io mut dyn BufRead,
  ) -> Self {
    let reg_count = main_chunk.reg_count;
    let functions: IndexMap<Rc<str>, Rc<UserFunction>> = functions
      .into_iter()
      .map(|(name, func)| (Rc::from(name.as_str()), Rc::new(func)))
      .collect();
    Self {
      main_chunk,
      functions,
      frames: vec![Frame {
        chunk_name: None,
        pc: 0,
        registers: vec![Value::default(); reg_count],
        return_reg: 0,
      }],
      stdout,
      stdin,
    }
  }

  pub fn run(&mut self) -> Result<()> {
    loop {
      let inst = self.fetch()?;
      self.frames.last_mut().expect("at least one frame").pc += 1;

      match inst.op {
        Opcode::Halt => return Ok(()),
        Opcode::Constant => self.exec_constant(inst),
        Opcode::GetLocal => self.exec_copy(inst),
        Opcode::SetLocal => self.exec_copy(inst),
        Opcode::RegisterLocal => self.exec_copy(inst),
        Opcode::Add => self.exec_binop(inst, ops::add)?,
        Opcode::Sub => self.exec_binop(inst, ops::sub)?,
        Opcode::Mul => self.exec_binop(inst, ops::mul)?,
        Opcode::Div => self.exec_binop(inst, ops::div)?,
        Opcode::Equal => self.exec_binop(inst, ops::equal)?,
        Opcode::Greater => self.exec_binop(inst, ops::greater)?,
        Opcode::Less => self.exec_binop(inst, ops::less)?,
        Opcode::GreaterEqual => self.exec_binop(inst, ops::greater_equal)?,
        Opcode::LessEqual => self.exec_binop(inst, ops::less_equal)?,
        Opcode::Not => {
          let v = self.read_reg(inst.arg1 as usize);
          self.write_reg(inst.result as usize, ops::not(&v));
        }
        Opcode::Jump => {
          self.frames.last_mut().expect("at least one frame").pc = inst.arg1 as usize;
        }
        Opcode::JumpIfFalse => {
          let cond = self.read_reg(inst.arg1 as usize);
          if cond.is_falsy() {
            self.frames.last_mut().expect("at least one frame").pc = inst.result as usize;
          }
        }
        Opcode::Call => self.exec_call(inst)?,
        Opcode::ReturnVal => {
          let value = self.read_reg(inst.arg1 as usize);
          let finished = self.frames.pop().expect("at least one frame");
          if self.frames.is_empty() {
            return Ok(());
          }
          self.write_reg(finished.return_reg, value);
        }
      }
    }
  }

  fn fetch(&self) -> Result<Instruction> {
    let frame = self.frames.last().expect("at least one frame");
    let chunk = self.chunk_for(frame.chunk_name.as_deref());
    chunk
      .code
      .get(frame.pc)
      .copied()
      .ok_or_else(|| RuntimeError::new("program counter ran past the end of its chunk").into())
  }

  fn chunk_for(&self, name: Option<&str>) -> &Chunk {
    match name {
      None => &self.main_chunk,
      Some(name) => &self.functions[name].chunk,
    }
  }

  fn current_chunk(&self) -> &Chunk {
    let name = self.frames.last().expect("at least one frame").chunk_name.clone();
    self.chunk_for(name.as_deref())
  }

  fn read_reg(&self, reg: usize) -> Value {
    self.frames.last().expect("at least one frame").registers[reg].clone()
  }

  fn write_reg(&mut self, reg: usize, value: Value) {
    self.frames.last_mut().expect("at least one frame").registers[reg] = value;
  }

  fn exec_constant(&mut self, inst: Instruction) {
    let idx = inst.arg1;
    let value = if idx >= 0 {
      Value::Number(self.current_chunk().const_numbers[idx as usize])
    } else {
      let str_idx = !idx as usize;
      Value::string(self.current_chunk().const_strings[str_idx].clone())
    };
    self.write_reg(inst.result as usize, value);
  }

  /// `GET_LOCAL`, `SET_LOCAL`, and `REGISTER_LOCAL` all copy `arg1` into
  /// `result`; they differ only in which compiler context emits them.
  fn exec_copy(&mut self, inst: Instruction) {
    let value = self.read_reg(inst.arg1 as usize);
    self.write_reg(inst.result as usize, value);
  }

  fn exec_binop(&mut self, inst: Instruction, f: impl Fn(&Value, &Value) -> Result<Value>) -> Result<()> {
    let a = self.read_reg(inst.arg1 as usize);
    let b = self.read_reg(inst.arg2 as usize);
    let result = f(&a, &b)?;
    self.write_reg(inst.result as usize, result);
    Ok(())
  }

  fn exec_call(&mut self, inst: Instruction) -> Result<()> {
    let name = match self.read_reg(inst.arg1 as usize) {
      Value::String(s) => s,
      _ => return Err(RuntimeError::new("call target must be a function name").into()),
    };
    let argc = inst.arg2 as usize;
    let result_reg = inst.result as usize;
    let window_start = result_reg - argc;
    let args: Vec<Value> = (0..argc).map(|i| self.read_reg(window_start + i)).collect();

    match name.as_ref() {
      "print" => {
        let result = builtins::print(&args, self.stdout)?;
        self.write_reg(result_reg, result);
      }
      "input" => {
        let result = builtins::input(&args, self.stdout, self.stdin)?;
        self.write_reg(result_reg, result);
      }
      "str2int" => {
        let result = builtins::str2int(&args)?;
        self.write_reg(result_reg, result);
      }
      _ => self.exec_user_call(&name, args, result_reg)?,
    }
    Ok(())
  }

  fn exec_user_call(&mut self, name: &str, args: Vec<Value>, result_reg: usize) -> Result<()> {
    if self.frames.len() >= MAX_CALL_DEPTH {
      return Err(RuntimeError::new(format!("call stack exceeded depth {MAX_CALL_DEPTH}")).into());
    }
    let func = self
      .functions
      .get(name)
      .ok_or_else(|| RuntimeError::new(format!("undefined function '{name}'")))?
      .clone();
    if args.len() != func.params.len() {
      return Err(RuntimeError::new(format!(
        "'{}' expects {} argument(s), got {}",
        func.name,
        func.params.len(),
        args.len()
      ))
      .into());
    }

    let mut registers = vec![Value::default(); func.chunk.reg_count];
    for (slot, arg) in registers.iter_mut().zip(args) {
      *slot = arg;
    }
    let key = self.functions.get_key_value(name).expect("looked up above").0.clone();
    self.frames.push(Frame {
      chunk_name: Some(key),
      pc: 0,
      registers,
      return_reg: result_reg,
    });
    Ok(())
  }
}
