//! Recursive-descent parser: tokens in, [`ast::Block`] out.
//!
//! Standard precedence climbing: assignment, equality, comparison, term,
//! factor, unary, call, primary. A call's callee and an assignment's target
//! must be a bare identifier; rather than allowing any expression through
//! and rejecting non-identifiers later, the `Call`/`Assign` AST nodes only
//! ever hold an identifier, so that restriction is a parse error here
//! instead of a downstream check.

use crate::ast::{BinOp, Block, Expr, Stmt, UnOp};
use crate::error::{ParseError, Result};
use crate::token::{Span, Token, TokenKind};

const MAX_PARAMS: usize = 255;
const MAX_ARGS: usize = 255;

pub fn parse(tokens: Vec<Token>) -> Result<Block> {
  Parser::new(tokens).parse_program()
}

struct Parser {
  tokens: Vec<Token>,
  current: usize,
}

impl Parser {
  fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, current: 0 }
  }

  fn parse_program(&mut self) -> Result<Block> {
    let mut statements = Vec::new();
    while !self.is_at_end() {
      statements.push(self.statement()?);
    }
    Ok(Block { statements })
  }

  fn is_at_end(&self) -> bool {
    self.peek().kind == TokenKind::Eof
  }

  fn peek(&self) -> &Token {
    &self.tokens[self.current]
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.peek().kind == kind
  }

  fn advance(&mut self) -> Token {
    let token = self.tokens[self.current].clone();
    if !self.is_at_end() {
      self.current += 1;
    }
    token
  }

  fn eat(&mut self, kind: TokenKind) -> bool {
    if self.check(kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token> {
    if self.check(kind) {
      Ok(self.advance())
    } else {
      let found = self.peek().clone();
      Err(
        ParseError::new(
          format!("expected {kind} {context}, found {}", found.kind),
          found.span,
        )
        .into(),
      )
    }
  }

  fn error(&self, message: impl Into<String>, span: Span) -> crate::error::Error {
    ParseError::new(message, span).into()
  }

  // ---- statements ----------------------------------------------------

  fn statement(&mut self) -> Result<Stmt> {
    match self.peek().kind {
      TokenKind::If => self.if_statement(),
      TokenKind::For => self.for_statement(),
      TokenKind::While => self.while_statement(),
      TokenKind::Let => self.let_statement(),
      TokenKind::Func => self.func_statement(),
      TokenKind::Return => self.return_statement(),
      TokenKind::Break => self.break_statement(),
      TokenKind::Continue => self.continue_statement(),
      TokenKind::LBrace => Ok(Stmt::Block(self.block()?)),
      _ => self.expr_statement(),
    }
  }

  fn block(&mut self) -> Result<Block> {
    self.expect(TokenKind::LBrace, "to start a block")?;
    let mut statements = Vec::new();
    while !self.check(TokenKind::RBrace) && !self.is_at_end() {
      statements.push(self.statement()?);
    }
    self.expect(TokenKind::RBrace, "to close a block")?;
    Ok(Block { statements })
  }

  fn if_statement(&mut self) -> Result<Stmt> {
    self.advance(); // `if`
    self.expect(TokenKind::LParen, "after 'if'")?;
    let condition = self.expression()?;
    self.expect(TokenKind::RParen, "after if condition")?;
    let then_branch = self.block()?;

    let else_branch = if self.eat(TokenKind::Else) {
      if self.check(TokenKind::If) {
        let nested = self.if_statement()?;
        Some(Block {
          statements: vec![nested],
        })
      } else {
        Some(self.block()?)
      }
    } else {
      None
    };

    Ok(Stmt::If {
      condition,
      then_branch,
      else_branch,
    })
  }

  fn while_statement(&mut self) -> Result<Stmt> {
    self.advance(); // `while`
    self.expect(TokenKind::LParen, "after 'while'")?;
    let condition = self.expression()?;
    self.expect(TokenKind::RParen, "after while condition")?;
    let body = self.block()?;
    Ok(Stmt::While { condition, body })
  }

  fn for_statement(&mut self) -> Result<Stmt> {
    self.advance(); // `for`
    self.expect(TokenKind::LParen, "after 'for'")?;

    let initializer = if self.check(TokenKind::Semicolon) {
      self.advance();
      None
    } else if self.check(TokenKind::Let) {
      Some(Box::new(self.let_statement()?))
    } else {
      Some(Box::new(self.expr_statement()?))
    };

    let condition = if self.check(TokenKind::Semicolon) {
      None
    } else {
      Some(self.expression()?)
    };
    self.expect(TokenKind::Semicolon, "after for-loop condition")?;

    let increment = if self.check(TokenKind::RParen) {
      None
    } else {
      Some(self.expression()?)
    };
    self.expect(TokenKind::RParen, "after for-loop clauses")?;

    let body = self.block()?;
    Ok(Stmt::For {
      initializer,
      condition,
      increment,
      body,
    })
  }

  fn let_statement(&mut self) -> Result<Stmt> {
    self.advance(); // `let`
    let name = self.expect(TokenKind::Identifier, "as a variable name")?.lexeme;
    let initializer = if self.eat(TokenKind::Equal) {
      Some(self.expression()?)
    } else {
      None
    };
    self.expect(TokenKind::Semicolon, "after let statement")?;
    Ok(Stmt::Let { name, initializer })
  }

  fn func_statement(&mut self) -> Result<Stmt> {
    self.advance(); // `func`
    let name = self.expect(TokenKind::Identifier, "as a function name")?.lexeme;
    self.expect(TokenKind::LParen, "after function name")?;

    let mut params = Vec::new();
    if !self.check(TokenKind::RParen) {
      loop {
        if params.len() >= MAX_PARAMS {
          return Err(self.error(
            format!("a function cannot have more than {MAX_PARAMS} parameters"),
            self.peek().span,
          ));
        }
        params.push(self.expect(TokenKind::Identifier, "as a parameter name")?.lexeme);
        if !self.eat(TokenKind::Comma) {
          break;
        }
      }
    }
    self.expect(TokenKind::RParen, "after parameter list")?;
    let body = self.block()?;
    Ok(Stmt::Func { name, params, body })
  }

  fn return_statement(&mut self) -> Result<Stmt> {
    self.advance(); // `return`
    let value = if self.check(TokenKind::Semicolon) {
      None
    } else {
      Some(self.expression()?)
    };
    self.expect(TokenKind::Semicolon, "after return statement")?;
    Ok(Stmt::Return(value))
  }

  fn break_statement(&mut self) -> Result<Stmt> {
    self.advance();
    self.expect(TokenKind::Semicolon, "after break")?;
    Ok(Stmt::Break)
  }

  fn continue_statement(&mut self) -> Result<Stmt> {
    self.advance();
    self.expect(TokenKind::Semicolon, "after continue")?;
    Ok(Stmt::Continue)
  }

  fn expr_statement(&mut self) -> Result<Stmt> {
    let expr = self.expression()?;
    self.expect(TokenKind::Semicolon, "after expression")?;
    Ok(Stmt::Expr(expr))
  }

  // ---- expressions, lowest to highest precedence ----------------------

  fn expression(&mut self) -> Result<Expr> {
    self.assignment()
  }

  fn assignment(&mut self) -> Result<Expr> {
    let expr = self.equality()?;

    if self.check(TokenKind::Equal) {
      let eq = self.advance();
      let value = self.assignment()?;
      return match expr {
        Expr::Variable(name) => Ok(Expr::Assign {
          name,
          value: Box::new(value),
        }),
        _ => Err(self.error("invalid assignment target", eq.span)),
      };
    }

    Ok(expr)
  }

  fn equality(&mut self) -> Result<Expr> {
    let mut expr = self.comparison()?;
    loop {
      let op = match self.peek().kind {
        TokenKind::EqualEqual => BinOp::Equal,
        TokenKind::BangEqual => BinOp::NotEqual,
        _ => break,
      };
      self.advance();
      let right = self.comparison()?;
      expr = Expr::Binary {
        op,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn comparison(&mut self) -> Result<Expr> {
    let mut expr = self.term()?;
    loop {
      let op = match self.peek().kind {
        TokenKind::Greater => BinOp::Greater,
        TokenKind::GreaterEqual => BinOp::GreaterEqual,
        TokenKind::Less => BinOp::Less,
        TokenKind::LessEqual => BinOp::LessEqual,
        _ => break,
      };
      self.advance();
      let right = self.term()?;
      expr = Expr::Binary {
        op,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn term(&mut self) -> Result<Expr> {
    let mut expr = self.factor()?;
    loop {
      let op = match self.peek().kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        _ => break,
      };
      self.advance();
      let right = self.factor()?;
      expr = Expr::Binary {
        op,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn factor(&mut self) -> Result<Expr> {
    let mut expr = self.unary()?;
    loop {
      let op = match self.peek().kind {
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        _ => break,
      };
      self.advance();
      let right = self.unary()?;
      expr = Expr::Binary {
        op,
        left: Box::new(expr),
        right: Box::new(right),
      };
    }
    Ok(expr)
  }

  fn unary(&mut self) -> Result<Expr> {
    let op = match self.peek().kind {
      TokenKind::Bang => UnOp::Not,
      TokenKind::Minus => UnOp::Neg,
      _ => return self.call(),
    };
    self.advance();
    let right = self.unary()?;
    Ok(Expr::Unary {
      op,
      right: Box::new(right),
    })
  }

  fn call(&mut self) -> Result<Expr> {
    let expr = self.primary()?;

    if self.check(TokenKind::LParen) {
      let Expr::Variable(callee) = expr else {
        return Err(self.error(
          "only a plain function name can be called",
          self.peek().span,
        ));
      };
      self.advance(); // `(`
      return self.finish_call(callee);
    }

    Ok(expr)
  }

  fn finish_call(&mut self, callee: String) -> Result<Expr> {
    let mut arguments = Vec::new();
    if !self.check(TokenKind::RParen) {
      loop {
        if arguments.len() >= MAX_ARGS {
          return Err(self.error(
            format!("a call cannot have more than {MAX_ARGS} arguments"),
            self.peek().span,
          ));
        }
        arguments.push(self.expression()?);
        if !self.eat(TokenKind::Comma) {
          break;
        }
      }
    }
    self.expect(TokenKind::RParen, "after call arguments")?;
    Ok(Expr::Call { callee, arguments })
  }

  fn primary(&mut self) -> Result<Expr> {
    let token = self.peek().clone();
    match token.kind {
      TokenKind::Number => {
        self.advance();
        let value: f64 = token
          .lexeme
          .parse()
          .map_err(|_| self.error(format!("invalid number literal '{}'", token.lexeme), token.span))?;
        Ok(Expr::Number(value))
      }
      TokenKind::String => {
        self.advance();
        Ok(Expr::Str(token.lexeme))
      }
      TokenKind::Identifier => {
        self.advance();
        Ok(Expr::Variable(token.lexeme))
      }
      TokenKind::True => {
        self.advance();
        Ok(Expr::Number(1.0))
      }
      TokenKind::False => {
        self.advance();
        Ok(Expr::Number(0.0))
      }
      TokenKind::LParen => {
        self.advance();
        let expr = self.expression()?;
        self.expect(TokenKind::RParen, "to close a parenthesized expression")?;
        Ok(expr)
      }
      _ => Err(self.error(format!("unexpected {}", token.kind), token.span)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexer::Lexer;

  fn parse_src(src: &str) -> Block {
    let tokens = Lexer::new(src).scan().unwrap();
    parse(tokens).unwrap()
  }

  #[test]
  fn operator_precedence_builds_a_left_leaning_tree() {
    let block = parse_src("1 + 2 * 3;");
    let Stmt::Expr(Expr::Binary { op: BinOp::Add, left, right }) = &block.statements[0] else {
      panic!("expected a top-level addition");
    };
    assert!(matches!(**left, Expr::Number(1.0)));
    assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
  }

  #[test]
  fn assignment_is_right_associative() {
    let block = parse_src("a = b = 1;");
    let Stmt::Expr(Expr::Assign { name, value }) = &block.statements[0] else {
      panic!("expected an assignment");
    };
    assert_eq!(name, "a");
    assert!(matches!(**value, Expr::Assign { .. }));
  }

  #[test]
  fn else_if_chains_nest_as_synthetic_blocks() {
    let block = parse_src("if (a) { } else if (b) { } else { }");
    let Stmt::If { else_branch: Some(branch), .. } = &block.statements[0] else {
      panic!("expected an else branch");
    };
    assert_eq!(branch.statements.len(), 1);
    assert!(matches!(branch.statements[0], Stmt::If { .. }));
  }

  #[test]
  fn call_callee_must_be_an_identifier() {
    let tokens = Lexer::new("(1)(2);").scan().unwrap();
    assert!(parse(tokens).is_err());
  }

  #[test]
  fn assignment_target_must_be_an_identifier() {
    let tokens = Lexer::new("1 = 2;").scan().unwrap();
    assert!(parse(tokens).is_err());
  }

  #[test]
  fn for_loop_clauses_are_all_optional() {
    let block = parse_src("for (;;) { break; }");
    let Stmt::For { initializer, condition, increment, .. } = &block.statements[0] else {
      panic!("expected a for loop");
    };
    assert!(initializer.is_none());
    assert!(condition.is_none());
    assert!(increment.is_none());
  }
}
