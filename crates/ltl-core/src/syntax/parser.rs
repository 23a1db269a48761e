//! Recursive-descent parser for LTL formulas
//!
//! Precedence, loosest first: `↔`, `→`, `∨`, `∧`, `U`, unary. `→`, `↔` and
//! `U` associate to the right; `∧` and `∨` are associative so either reading
//! is fine and we fold to the left.

use crate::formula::Formula;
use crate::syntax::lexer::Token;
use logos::Logos;
use std::ops::Range;
use thiserror::Error;

/// Formula parse error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character no token starts with
    #[error("unexpected character at byte {offset}")]
    UnexpectedCharacter { offset: usize },

    /// A well-formed token in the wrong place
    #[error("unexpected {found} at byte {offset}, expected {expected}")]
    UnexpectedToken {
        found: &'static str,
        expected: &'static str,
        offset: usize,
    },

    /// Input ended mid-formula
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    /// Input contained no tokens at all
    #[error("empty formula")]
    Empty,
}

/// Parse a formula from source text.
pub fn parse(src: &str) -> Result<Formula, ParseError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(src).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(ParseError::UnexpectedCharacter { offset: span.start }),
        }
    }
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let formula = parser.iff()?;
    match parser.peek() {
        None => Ok(formula),
        Some((token, span)) => Err(ParseError::UnexpectedToken {
            found: token.describe(),
            expected: "end of input",
            offset: span.start,
        }),
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<(Token, Range<usize>)> {
        self.tokens.get(self.pos).cloned()
    }

    fn bump(&mut self) -> Option<(Token, Range<usize>)> {
        let entry = self.peek();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    fn eat(&mut self, token: Token) -> bool {
        if matches!(self.peek(), Some((t, _)) if t == token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn iff(&mut self) -> Result<Formula, ParseError> {
        let lhs = self.implies()?;
        if self.eat(Token::Iff) {
            let rhs = self.iff()?;
            return Ok(Formula::iff(lhs, rhs));
        }
        Ok(lhs)
    }

    fn implies(&mut self) -> Result<Formula, ParseError> {
        let lhs = self.or()?;
        if self.eat(Token::Implies) {
            let rhs = self.implies()?;
            return Ok(Formula::implies(lhs, rhs));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<Formula, ParseError> {
        let mut lhs = self.and()?;
        while self.eat(Token::Or) {
            let rhs = self.and()?;
            lhs = Formula::or(lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Formula, ParseError> {
        let mut lhs = self.until()?;
        while self.eat(Token::And) {
            let rhs = self.until()?;
            lhs = Formula::and(lhs, rhs);
        }
        Ok(lhs)
    }

    fn until(&mut self) -> Result<Formula, ParseError> {
        let lhs = self.unary()?;
        if self.eat(Token::Until) {
            let rhs = self.until()?;
            return Ok(Formula::until(lhs, rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Formula, ParseError> {
        const EXPECTED: &str = "a formula";

        let Some((token, span)) = self.bump() else {
            return Err(ParseError::UnexpectedEnd { expected: EXPECTED });
        };
        match token {
            Token::Not => Ok(Formula::not(self.unary()?)),
            Token::Next => Ok(Formula::next(self.unary()?)),
            Token::Always => Ok(Formula::always(self.unary()?)),
            Token::Eventually => Ok(Formula::eventually(self.unary()?)),
            Token::True => Ok(Formula::True),
            Token::False => Ok(Formula::False),
            Token::Ident => Ok(Formula::atom(&self.src[span])),
            Token::LParen => {
                let inner = self.iff()?;
                match self.bump() {
                    Some((Token::RParen, _)) => Ok(inner),
                    Some((token, span)) => Err(ParseError::UnexpectedToken {
                        found: token.describe(),
                        expected: "`)`",
                        offset: span.start,
                    }),
                    None => Err(ParseError::UnexpectedEnd { expected: "`)`" }),
                }
            }
            _ => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                expected: EXPECTED,
                offset: span.start,
            }),
        }
    }
}
