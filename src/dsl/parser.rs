//! Parser for the DSL.
//!
//! Parses a token stream into a [`Script`]. A statement is either a track
//! call, a functional call (`filter`, `map`, `for_each`) or a utility method,
//! followed by an optional chain of `.method(...)` calls. Predicates are
//! read as a single `binder.field op literal` unit.

use std::collections::BTreeMap;
use std::mem::discriminant;

use super::ast::*;
use super::error::SyntaxError;
use super::token::{Token, TokenKind};
use super::value::Value;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// The stream should end in `Eof`; one is appended if it doesn't.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col));
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
                col,
            });
        }
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Script, SyntaxError> {
        let mut statements = Vec::new();

        self.skip_separators();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);

            let next = self.peek().kind.clone();
            match next {
                TokenKind::Newline | TokenKind::Semicolon => self.skip_separators(),
                TokenKind::Eof => break,
                _ => {
                    let t = self.peek();
                    return Err(SyntaxError::parse(
                        format!("expected end of statement, got {}", t.kind.describe()),
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        Ok(Script { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        let line = self.peek().line;
        let head = self.parse_head()?;
        let chainable = !matches!(head, CallEvent::Map { .. } | CallEvent::ForEach { .. });

        let mut calls = vec![head];

        while self.check(TokenKind::Dot) || self.check_skip_newlines(TokenKind::Dot) {
            if !chainable {
                let t = self.peek();
                return Err(SyntaxError::parse(
                    format!("'{}' cannot be followed by a chained call", calls[0].name()),
                    t.line,
                    t.col,
                ));
            }
            self.advance(); // consume '.'
            calls.push(self.parse_chain_call()?);
        }

        Ok(Statement { calls, line })
    }

    fn parse_head(&mut self) -> Result<CallEvent, SyntaxError> {
        let t = self.peek().clone();
        match &t.kind {
            TokenKind::Track => self.parse_track_call(),
            TokenKind::Filter => self.parse_filter(),
            TokenKind::Map => {
                self.advance();
                let (collection, func) = self.parse_functional_args()?;
                Ok(CallEvent::Map { collection, func })
            }
            TokenKind::ForEach => {
                self.advance();
                let (collection, func) = self.parse_functional_args()?;
                Ok(CallEvent::ForEach { collection, func })
            }
            TokenKind::Ident(name) => match Method::from_name(name) {
                Some(method) if method.is_statement_head() => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    Ok(CallEvent::Method { method, args })
                }
                Some(method) => Err(SyntaxError::parse(
                    format!("'{method}' must be chained onto a track or filter call"),
                    t.line,
                    t.col,
                )),
                None => Err(SyntaxError::parse(
                    format!("unknown statement '{name}'"),
                    t.line,
                    t.col,
                )),
            },
            other => Err(SyntaxError::parse(
                format!("expected a statement, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    /// `track(...)`. A lone number is shorthand for `id=N`.
    fn parse_track_call(&mut self) -> Result<CallEvent, SyntaxError> {
        self.advance(); // consume 'track'
        self.expect(TokenKind::LParen)?;
        self.skip_newlines();

        if let TokenKind::Number(n) = self.peek().kind {
            self.advance();
            self.skip_newlines();
            self.expect(TokenKind::RParen)?;
            let mut args = Args::new();
            args.insert("id", Value::Number(n));
            return Ok(CallEvent::Track(args));
        }

        let args = self.parse_kwargs(TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(CallEvent::Track(args))
    }

    fn parse_filter(&mut self) -> Result<CallEvent, SyntaxError> {
        self.advance(); // consume 'filter'
        self.expect(TokenKind::LParen)?;
        self.skip_newlines();
        let collection = self.expect_name()?;
        self.expect(TokenKind::Comma)?;
        self.skip_newlines();
        let predicate = self.parse_predicate()?;
        self.skip_newlines();
        self.expect(TokenKind::RParen)?;
        Ok(CallEvent::Filter {
            collection,
            predicate,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, SyntaxError> {
        let binder = self.expect_name()?;
        self.expect(TokenKind::Dot)?;
        let field = self.expect_name()?;

        let t = self.advance().clone();
        let op = match t.kind {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::GtEq => CompareOp::GtEq,
            TokenKind::In => CompareOp::In,
            other => {
                return Err(SyntaxError::parse(
                    format!("expected comparison operator, got {}", other.describe()),
                    t.line,
                    t.col,
                ));
            }
        };

        let lit_tok = self.peek().clone();
        let literal = self.parse_value()?;
        if op == CompareOp::In && literal.as_array().is_none() {
            return Err(SyntaxError::parse(
                format!("'in' expects an array, got {}", literal.type_name()),
                lit_tok.line,
                lit_tok.col,
            ));
        }

        Ok(Predicate {
            binder,
            field,
            op,
            literal,
        })
    }

    /// `(collection, @name)` or `(collection, binder.method(args))`.
    fn parse_functional_args(&mut self) -> Result<(String, FunctionRef), SyntaxError> {
        self.expect(TokenKind::LParen)?;
        self.skip_newlines();
        let collection = self.expect_name()?;
        self.expect(TokenKind::Comma)?;
        self.skip_newlines();

        let func = if self.check(TokenKind::At) {
            self.advance();
            FunctionRef::Named(self.expect_name()?)
        } else {
            let binder = self.expect_name()?;
            self.expect(TokenKind::Dot)?;
            let method = self.expect_method()?;
            let args = self.parse_call_args()?;
            FunctionRef::MethodCall {
                binder,
                method,
                args,
            }
        };

        self.skip_newlines();
        self.expect(TokenKind::RParen)?;
        Ok((collection, func))
    }

    fn parse_chain_call(&mut self) -> Result<CallEvent, SyntaxError> {
        let method = self.expect_method()?;
        let args = self.parse_call_args()?;
        Ok(CallEvent::Method { method, args })
    }

    /// `( kwargs? )`
    fn parse_call_args(&mut self) -> Result<Args, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let args = self.parse_kwargs(TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// `key=value (, key=value)*` up to (not including) `closing`.
    fn parse_kwargs(&mut self, closing: TokenKind) -> Result<Args, SyntaxError> {
        let mut args = Args::new();
        self.skip_newlines();

        while !self.check(closing.clone()) {
            let key_tok = self.peek().clone();
            let key = self.expect_name()?;
            self.expect(TokenKind::Eq)?;
            let value = self.parse_value()?;
            if !args.insert(key.clone(), value) {
                return Err(SyntaxError::parse(
                    format!("duplicate argument '{key}'"),
                    key_tok.line,
                    key_tok.col,
                ));
            }

            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }

        Ok(args)
    }

    fn parse_value(&mut self) -> Result<Value, SyntaxError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Str(s) => {
                self.advance();
                Ok(Value::String(s))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Value::Number(n))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Value::Bool(b))
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => {
                self.advance();
                let fields = self.parse_kwargs(TokenKind::RBrace)?;
                self.expect(TokenKind::RBrace)?;
                let object: BTreeMap<String, Value> = fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();
                Ok(Value::Object(object))
            }
            other => Err(SyntaxError::parse(
                format!("expected a literal value, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn parse_array(&mut self) -> Result<Value, SyntaxError> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        self.skip_newlines();

        while !self.check(TokenKind::RBracket) {
            items.push(self.parse_value()?);
            self.skip_newlines();
            if self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }

        self.expect(TokenKind::RBracket)?;
        Ok(Value::Array(items))
    }

    // --- Helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.tokens[self.pos].kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        discriminant(&self.peek().kind) == discriminant(&kind)
    }

    /// Look past newlines for `kind`; consume the newlines only on a match.
    fn check_skip_newlines(&mut self, kind: TokenKind) -> bool {
        let saved = self.pos;
        self.skip_newlines();
        if self.check(kind) {
            true
        } else {
            self.pos = saved;
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while self.check(TokenKind::Newline) || self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, SyntaxError> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(SyntaxError::parse(
                format!("expected {}, got {}", kind.describe(), t.kind.describe()),
                t.line,
                t.col,
            ))
        }
    }

    /// An identifier, or a keyword used as a name (`track.name`, `map`).
    fn expect_name(&mut self) -> Result<String, SyntaxError> {
        let t = self.peek().clone();
        let name = match &t.kind {
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Track => "track".to_string(),
            TokenKind::Filter => "filter".to_string(),
            TokenKind::Map => "map".to_string(),
            TokenKind::ForEach => "for_each".to_string(),
            other => {
                return Err(SyntaxError::parse(
                    format!("expected a name, got {}", other.describe()),
                    t.line,
                    t.col,
                ));
            }
        };
        self.advance();
        Ok(name)
    }

    fn expect_method(&mut self) -> Result<Method, SyntaxError> {
        let t = self.peek().clone();
        let name = self.expect_name()?;
        Method::from_name(&name).ok_or_else(|| {
            SyntaxError::parse(format!("unknown method '{name}'"), t.line, t.col)
        })
    }
}
