//! DSL front-end: source text → tokens → [`Script`].

pub mod ast;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::*;
pub use error::SyntaxError;
pub use value::Value;

use lexer::Lexer;
use parser::Parser;

/// Maximum number of characters of DSL text shown in log lines.
pub const PREVIEW_LEN: usize = 200;

const STATEMENT_HEADS: &[&str] = &["track(", "filter(", "map(", "for_each("];

const CHAIN_MARKERS: &[&str] = &[
    ".new_clip(",
    ".newClip(",
    ".add_fx(",
    ".addFX(",
    ".addFx(",
    ".set_track(",
    ".setTrack(",
    ".delete(",
    ".delete_clip(",
    ".deleteClip(",
    ".set_clip(",
    ".setClip(",
    ".move_clip(",
    ".moveClip(",
    ".add_automation(",
    ".addAutomation(",
];

/// The DSL front-end.
///
/// Parsing never touches session state; it only turns text into a [`Script`].
pub struct Dsl;

impl Dsl {
    /// Parse DSL source into a Script AST.
    pub fn parse(source: &str) -> Result<Script, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    /// Cheap check for whether `text` is DSL rather than prose or JSON.
    pub fn looks_like_dsl(text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || text.starts_with('{') || text.starts_with('[') {
            return false;
        }
        STATEMENT_HEADS.iter().any(|head| text.starts_with(head))
            || CHAIN_MARKERS.iter().any(|marker| text.contains(marker))
    }

    /// The first [`PREVIEW_LEN`] characters of `text`, for logging.
    pub fn preview(text: &str) -> String {
        match text.char_indices().nth(PREVIEW_LEN) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        }
    }
}
