//! The scanner: source text in, a finite token stream out.
//!
//! Scans the whole source in a single pass, rather than re-instantiating a
//! fresh lexer per line. A line-by-line scanner loses its position and any
//! token that spans a line break at every newline boundary; that behavior
//! isn't part of this language's contract, so it isn't reproduced here.

use crate::error::{LexError, Result};
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'src> {
  source: &'src [u8],
  pos: usize,
}

impl<'src> Lexer<'src> {
  pub fn new(source: &'src str) -> Self {
    Self {
      source: source.as_bytes(),
      pos: 0,
    }
  }

  /// Scan the entire source into a token stream terminated by a single
  /// trailing [`TokenKind::Eof`].
  pub fn scan(mut self) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    loop {
      let token = self.next_token()?;
      let done = token.kind == TokenKind::Eof;
      tokens.push(token);
      if done {
        return Ok(tokens);
      }
    }
  }

  fn peek(&self) -> u8 {
    self.source.get(self.pos).copied().unwrap_or(0)
  }

  fn peek_at(&self, offset: usize) -> u8 {
    self.source.get(self.pos + offset).copied().unwrap_or(0)
  }

  fn advance(&mut self) -> u8 {
    let c = self.peek();
    if c != 0 {
      self.pos += 1;
    }
    c
  }

  fn eat(&mut self, expected: u8) -> bool {
    if self.peek() == expected {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn skip_whitespace(&mut self) {
    while matches!(self.peek(), b' ' | b'\t' | b'\r' | b'\n') {
      self.pos += 1;
    }
  }

  fn next_token(&mut self) -> Result<Token> {
    self.skip_whitespace();
    let start = self.pos;

    let c = self.advance();
    if c == 0 {
      return Ok(Token::new(TokenKind::Eof, "", Span::new(start, start)));
    }

    let kind = match c {
      b'+' => TokenKind::Plus,
      b'-' => TokenKind::Minus,
      b'*' => TokenKind::Star,
      b'/' => TokenKind::Slash,
      b'(' => TokenKind::LParen,
      b')' => TokenKind::RParen,
      b'{' => TokenKind::LBrace,
      b'}' => TokenKind::RBrace,
      b';' => TokenKind::Semicolon,
      b',' => TokenKind::Comma,
      b'=' => {
        if self.eat(b'=') {
          TokenKind::EqualEqual
        } else {
          TokenKind::Equal
        }
      }
      b'<' => {
        if self.eat(b'=') {
          TokenKind::LessEqual
        } else {
          TokenKind::Less
        }
      }
      b'>' => {
        if self.eat(b'=') {
          TokenKind::GreaterEqual
        } else {
          TokenKind::Greater
        }
      }
      b'!' => {
        if self.eat(b'=') {
          TokenKind::BangEqual
        } else {
          TokenKind::Bang
        }
      }
      b'"' => return self.string(start),
      c if c.is_ascii_digit() => return Ok(self.number(start)),
      c if c.is_ascii_alphabetic() || c == b'_' => return Ok(self.identifier(start)),
      c => {
        return Err(
          LexError::new(
            format!("unexpected character {:?}", c as char),
            Span::new(start, self.pos),
          )
          .into(),
        )
      }
    };

    let lexeme = self.lexeme(start);
    Ok(Token::new(kind, lexeme, Span::new(start, self.pos)))
  }

  fn lexeme(&self, start: usize) -> String {
    String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
  }

  fn string(&mut self, start: usize) -> Result<Token> {
    while self.peek() != b'"' && self.peek() != 0 {
      self.advance();
    }
    if self.peek() != b'"' {
      return Err(
        LexError::new(
          "missing terminating '\"' character",
          Span::new(start, self.pos),
        )
        .into(),
      );
    }
    let text = String::from_utf8_lossy(&self.source[start + 1..self.pos]).into_owned();
    self.advance(); // closing quote
    Ok(Token::new(TokenKind::String, text, Span::new(start, self.pos)))
  }

  fn number(&mut self, start: usize) -> Token {
    while self.peek().is_ascii_digit() {
      self.advance();
    }
    if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
      self.advance();
      while self.peek().is_ascii_digit() {
        self.advance();
      }
    }
    let lexeme = self.lexeme(start);
    Token::new(TokenKind::Number, lexeme, Span::new(start, self.pos))
  }

  fn identifier(&mut self, start: usize) -> Token {
    while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
      self.advance();
    }
    let lexeme = self.lexeme(start);
    let kind = match lexeme.as_str() {
      "let" => TokenKind::Let,
      "if" => TokenKind::If,
      "else" => TokenKind::Else,
      "for" => TokenKind::For,
      "while" => TokenKind::While,
      "true" => TokenKind::True,
      "false" => TokenKind::False,
      "func" => TokenKind::Func,
      "break" => TokenKind::Break,
      "continue" => TokenKind::Continue,
      "return" => TokenKind::Return,
      _ => TokenKind::Identifier,
    };
    Token::new(kind, lexeme, Span::new(start, self.pos))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<TokenKind> {
    Lexer::new(src)
      .scan()
      .unwrap()
      .into_iter()
      .map(|t| t.kind)
      .collect()
  }

  #[test]
  fn keywords_and_identifiers() {
    assert_eq!(
      kinds("let x if notakeyword"),
      vec![
        TokenKind::Let,
        TokenKind::Identifier,
        TokenKind::If,
        TokenKind::Identifier,
        TokenKind::Eof
      ]
    );
  }

  #[test]
  fn two_char_operators_prefer_the_longer_match() {
    assert_eq!(
      kinds("== != <= >= = < > !"),
      vec![
        TokenKind::EqualEqual,
        TokenKind::BangEqual,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::Equal,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::Bang,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn number_literal_lexeme() {
    let tokens = Lexer::new("3.5").scan().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].lexeme, "3.5");
  }

  #[test]
  fn string_literal_strips_quotes() {
    let tokens = Lexer::new("\"hi\"").scan().unwrap();
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].lexeme, "hi");
  }

  #[test]
  fn unterminated_string_is_an_error() {
    assert!(Lexer::new("\"hi").scan().is_err());
  }

  #[test]
  fn whitespace_and_newlines_are_skipped() {
    assert_eq!(
      kinds("let\n  x\t=\r\n1;"),
      vec![
        TokenKind::Let,
        TokenKind::Identifier,
        TokenKind::Equal,
        TokenKind::Number,
        TokenKind::Semicolon,
        TokenKind::Eof
      ]
    );
  }
}
