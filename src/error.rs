//! Error types for the PDL pipeline.
//!
//! Every failure is fatal for the conversion at hand: the first error wins and
//! nothing is recovered. Lexer and parser errors carry the [`Position`] they
//! were raised at.

use std::fmt;

/// Source location: 1-based line and column (in characters), plus byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Malformed token stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {kind}")]
pub struct LexError {
    pub position: Position,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("tab character in indentation")]
    TabIndent,
    #[error("indentation of {width} spaces is not a multiple of {unit}")]
    MisalignedIndent { width: usize, unit: usize },
    #[error("dedent to {width} spaces does not match any enclosing block")]
    InconsistentDedent { width: usize },
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
}

/// Token stream that does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {message}")]
pub struct ParseError {
    pub position: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        ParseError {
            position,
            message: message.into(),
        }
    }

    /// `expected <what>, found <found>`
    pub fn expected(position: Position, what: &str, found: impl fmt::Display) -> Self {
        ParseError::new(position, format!("expected {}, found {}", what, found))
    }
}

/// Structurally empty document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmptyInputError {
    #[error("missing version declaration")]
    MissingVersion,
    #[error("document declares no domains")]
    NoDomains,
}

/// Invalid [`Options`](crate::Options).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("indent_unit must be at least 1")]
    ZeroIndentUnit,
    #[error("output_indent of {indent} exceeds the maximum of {max}")]
    OutputIndentTooLarge { indent: usize, max: usize },
}

/// Any failure of a conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lex error at {0}")]
    Lex(#[from] LexError),
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),
    #[error("empty input: {0}")]
    Empty(#[from] EmptyInputError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Position of a lex or parse error.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lex(e) => Some(e.position),
            Error::Parse(e) => Some(e.position),
            Error::Empty(_) | Error::Config(_) | Error::Json(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
