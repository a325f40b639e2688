//! Lexer for the DSL.
//!
//! Converts source text into a stream of [`Token`]s. Comparison operators are
//! always lexed as a single token (`>=` never splits into `>` and `=`), which
//! lets the parser read a predicate as one `property op literal` unit.

use super::error::SyntaxError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            self.skip_comment();
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();

            if ch == '\n' {
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line: self.line,
                    col: self.col,
                });
                self.advance();
                self.line += 1;
                self.col = 1;
                continue;
            }

            let token = match ch {
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                '[' => self.single_char(TokenKind::LBracket),
                ']' => self.single_char(TokenKind::RBracket),
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                ',' => self.single_char(TokenKind::Comma),
                ';' => self.single_char(TokenKind::Semicolon),
                '@' => self.single_char(TokenKind::At),
                '=' => self.one_or_two('=', TokenKind::Eq, TokenKind::EqEq),
                '<' => self.one_or_two('=', TokenKind::Lt, TokenKind::LtEq),
                '>' => self.one_or_two('=', TokenKind::Gt, TokenKind::GtEq),
                '!' => self.lex_bang()?,
                '"' => self.lex_string()?,
                '-' => self.lex_negative_number()?,
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '.' => self.single_char(TokenKind::Dot),
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(SyntaxError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch != '\n' {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        if !self.is_at_end() && self.peek() == '/' && self.peek_next() == Some('/') {
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    /// Lex `c` or `c` followed by `second`, e.g. `<` / `<=`.
    fn one_or_two(&mut self, second: char, single: TokenKind, double: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        if !self.is_at_end() && self.peek() == second {
            self.advance();
            Token {
                kind: double,
                line,
                col,
            }
        } else {
            Token {
                kind: single,
                line,
                col,
            }
        }
    }

    fn lex_bang(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume '!'
        if !self.is_at_end() && self.peek() == '=' {
            self.advance();
            Ok(Token {
                kind: TokenKind::NotEq,
                line,
                col,
            })
        } else {
            Err(SyntaxError::lex("expected '=' after '!'", line, col))
        }
    }

    fn lex_string(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume opening '"'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            let ch = self.advance();
            if ch == '\n' {
                return Err(SyntaxError::lex("unclosed string literal", line, col));
            }
            if ch == '\\' {
                if self.is_at_end() {
                    break;
                }
                match self.advance() {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => s.push(other),
                }
            } else {
                s.push(ch);
            }
        }
        if self.is_at_end() {
            return Err(SyntaxError::lex("unclosed string literal", line, col));
        }
        self.advance(); // consume closing '"'
        Ok(Token {
            kind: TokenKind::Str(s),
            line,
            col,
        })
    }

    fn lex_negative_number(&mut self) -> Result<Token, SyntaxError> {
        if self
            .peek_next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            return self.lex_number();
        }
        Err(SyntaxError::lex("unexpected '-'", self.line, self.col))
    }

    fn lex_number(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        if !self.is_at_end() && self.peek() == '-' {
            s.push(self.advance());
        }

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        if !self.is_at_end()
            && self.peek() == '.'
            && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            s.push(self.advance()); // consume '.'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        let val: f64 = s
            .parse()
            .map_err(|_| SyntaxError::lex(format!("invalid number: {s}"), line, col))?;
        if !val.is_finite() {
            return Err(SyntaxError::lex("number out of range", line, col));
        }
        Ok(Token {
            kind: TokenKind::Number(val),
            line,
            col,
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }

        let kind = match s.as_str() {
            "track" => TokenKind::Track,
            "filter" => TokenKind::Filter,
            "map" => TokenKind::Map,
            "for_each" => TokenKind::ForEach,
            "in" => TokenKind::In,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Ident(s),
        };

        Token { kind, line, col }
    }
}
