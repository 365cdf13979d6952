//! The abstract syntax tree.
//!
//! `Expr` and `Stmt` are tagged sum types with exhaustive case analysis,
//! replacing the polymorphic `Expr`/`Stmt` base classes and `dynamic_cast`
//! walks of the C++ source this language is modeled on. The compiler
//! (`src/compiler/{expr,stmt}.rs`) matches on them exhaustively instead of
//! testing each possible downcast in turn.

#[derive(Debug, Clone)]
pub struct Block {
  pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
  Let {
    name: String,
    initializer: Option<Expr>,
  },
  If {
    condition: Expr,
    then_branch: Block,
    else_branch: Option<Block>,
  },
  While {
    condition: Expr,
    body: Block,
  },
  For {
    initializer: Option<Box<Stmt>>,
    condition: Option<Expr>,
    increment: Option<Expr>,
    body: Block,
  },
  Func {
    name: String,
    params: Vec<String>,
    body: Block,
  },
  Return(Option<Expr>),
  Break,
  Continue,
  Expr(Expr),
  Block(Block),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Equal,
  NotEqual,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
  Not,
  Neg,
}

#[derive(Debug, Clone)]
pub enum Expr {
  Number(f64),
  Str(String),
  Variable(String),
  Binary {
    op: BinOp,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  Unary {
    op: UnOp,
    right: Box<Expr>,
  },
  Call {
    callee: String,
    arguments: Vec<Expr>,
  },
  Assign {
    name: String,
    value: Box<Expr>,
  },
}
