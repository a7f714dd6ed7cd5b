//! Recursive-descent parser for the condition/value grammar (spec §6.1).
//!
//! Precedence low to high: `||`, `&&`, unary `!`, comparison, primary. No
//! parentheses and no arithmetic — grouping is deliberately out of scope;
//! callers split into multiple branches instead.

use thiserror::Error;

use super::lexer::{tokenize, LexError, Token};
use super::value::EvalValue;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token: {0:?}")]
    UnexpectedToken(Token),
    #[error("trailing tokens after complete expression: {0:?}")]
    TrailingTokens(Vec<Token>),
    #[error("'${0}' is not a recognized variable root (only $results/$errors)")]
    UnknownRoot(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmpOp {
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Gt,
    Lt,
    Gte,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Variable(VarRoot, Vec<String>),
    Literal(EvalValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarRoot {
    Results,
    Errors,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Atom, CmpOp, Atom),
    Atom(Atom),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parse a full expression string into an [`Expr`] AST.
pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::TrailingTokens(
            parser.tokens[parser.pos..].to_vec(),
        ));
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_value()?;
        let op = match self.peek() {
            Some(Token::Eq) => Some(CmpOp::Eq),
            Some(Token::NotEq) => Some(CmpOp::NotEq),
            Some(Token::StrictEq) => Some(CmpOp::StrictEq),
            Some(Token::StrictNotEq) => Some(CmpOp::StrictNotEq),
            Some(Token::Gt) => Some(CmpOp::Gt),
            Some(Token::Lt) => Some(CmpOp::Lt),
            Some(Token::Gte) => Some(CmpOp::Gte),
            Some(Token::Lte) => Some(CmpOp::Lte),
            _ => None,
        };
        match op {
            None => Ok(Expr::Atom(left)),
            Some(op) => {
                self.advance();
                let right = self.parse_value()?;
                Ok(Expr::Compare(left, op, right))
            }
        }
    }

    fn parse_value(&mut self) -> Result<Atom, ParseError> {
        match self.advance().ok_or(ParseError::UnexpectedEnd)? {
            Token::True => Ok(Atom::Literal(EvalValue::bool(true))),
            Token::False => Ok(Atom::Literal(EvalValue::bool(false))),
            Token::Null => Ok(Atom::Literal(EvalValue::null())),
            Token::Undefined => Ok(Atom::Literal(EvalValue::Undefined)),
            Token::Number(n) => Ok(Atom::Literal(EvalValue::number(n))),
            Token::String(s) => Ok(Atom::Literal(EvalValue::string(s))),
            Token::Variable(mut path) => {
                let root_name = path.remove(0);
                let root = match root_name.as_str() {
                    "results" => VarRoot::Results,
                    "errors" => VarRoot::Errors,
                    other => return Err(ParseError::UnknownRoot(other.to_string())),
                };
                Ok(Atom::Variable(root, path))
            }
            other => Err(ParseError::UnexpectedToken(other)),
        }
    }
}
