//! Line-oriented lexer for PDL source.
//!
//! The lexer works one physical line at a time and keeps a stack of opened
//! indentation widths. A content line deeper than the top of the stack opens a
//! block ([`TokenKind::Indent`]); a shallower one closes blocks, one
//! [`TokenKind::Dedent`] per level. Comment lines and blank lines never touch
//! the stack, but they are still tokens: comments become descriptions and a
//! blank line (a lone [`TokenKind::Newline`]) separates a comment block from
//! the declaration below it.

use std::collections::VecDeque;
use std::fmt;

use crate::error::{LexError, LexErrorKind, Position};

/// Indentation unit used when none is configured.
pub const DEFAULT_INDENT_UNIT: usize = 2;

/// Reserved words. They are contextual: the parser also accepts them as names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Version,
    Major,
    Minor,
    Domain,
    Depends,
    On,
    Experimental,
    Deprecated,
    Type,
    Extends,
    Enum,
    Properties,
    Command,
    Event,
    Parameters,
    Returns,
    Redirect,
    Optional,
    Array,
    Of,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "version" => Keyword::Version,
            "major" => Keyword::Major,
            "minor" => Keyword::Minor,
            "domain" => Keyword::Domain,
            "depends" => Keyword::Depends,
            "on" => Keyword::On,
            "experimental" => Keyword::Experimental,
            "deprecated" => Keyword::Deprecated,
            "type" => Keyword::Type,
            "extends" => Keyword::Extends,
            "enum" => Keyword::Enum,
            "properties" => Keyword::Properties,
            "command" => Keyword::Command,
            "event" => Keyword::Event,
            "parameters" => Keyword::Parameters,
            "returns" => Keyword::Returns,
            "redirect" => Keyword::Redirect,
            "optional" => Keyword::Optional,
            "array" => Keyword::Array,
            "of" => Keyword::Of,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Version => "version",
            Keyword::Major => "major",
            Keyword::Minor => "minor",
            Keyword::Domain => "domain",
            Keyword::Depends => "depends",
            Keyword::On => "on",
            Keyword::Experimental => "experimental",
            Keyword::Deprecated => "deprecated",
            Keyword::Type => "type",
            Keyword::Extends => "extends",
            Keyword::Enum => "enum",
            Keyword::Properties => "properties",
            Keyword::Command => "command",
            Keyword::Event => "event",
            Keyword::Parameters => "parameters",
            Keyword::Returns => "returns",
            Keyword::Redirect => "redirect",
            Keyword::Optional => "optional",
            Keyword::Array => "array",
            Keyword::Of => "of",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    Symbol(char),
    StringLiteral(String),
    /// Digits only; kept as text so the parser decides the range.
    Number(String),
    /// Text after `#`. `trailing` comments follow other tokens on the same line.
    Comment { text: String, trailing: bool },
    Newline,
    /// A block opens at this width.
    Indent(usize),
    /// A block closes; the width of the block that continues.
    Dedent(usize),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier `{}`", name),
            TokenKind::Keyword(kw) => write!(f, "`{}`", kw.as_str()),
            TokenKind::Symbol(c) => write!(f, "`{}`", c),
            TokenKind::StringLiteral(s) => write!(f, "string {:?}", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Comment { .. } => write!(f, "comment"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Indent(_) => write!(f, "indented block"),
            TokenKind::Dedent(_) => write!(f, "end of block"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// Lazy token stream over one source string.
///
/// Iteration stops after [`TokenKind::Eof`] or after the first error.
/// [`Lexer::reset`] rewinds to the start of the source.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    unit: usize,
    offset: usize,
    line: usize,
    stack: Vec<usize>,
    queue: VecDeque<Token>,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer::with_indent_unit(source, DEFAULT_INDENT_UNIT)
    }

    /// `unit` is the number of spaces per indentation level (clamped to at least 1).
    pub fn with_indent_unit(source: &'src str, unit: usize) -> Self {
        Lexer {
            source,
            unit: unit.max(1),
            offset: 0,
            line: 1,
            stack: vec![0],
            queue: VecDeque::new(),
            done: false,
        }
    }

    pub fn indent_unit(&self) -> usize {
        self.unit
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.stack.clear();
        self.stack.push(0);
        self.queue.clear();
        self.done = false;
    }

    fn push(&mut self, kind: TokenKind, position: Position) {
        self.queue.push_back(Token { kind, position });
    }

    fn finish(&mut self) {
        let position = Position::new(self.line, 1, self.source.len());
        while self.stack.len() > 1 {
            self.stack.pop();
            let width = self.stack.last().copied().unwrap_or(0);
            self.push(TokenKind::Dedent(width), position);
        }
        self.push(TokenKind::Eof, position);
        self.done = true;
    }

    fn lex_line(&mut self) -> Result<(), LexError> {
        let rest = &self.source[self.offset..];
        let (raw, consumed) = match rest.find('\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let line = self.line;
        let line_start = self.offset;
        self.offset += consumed;
        self.line += 1;

        let width = raw.len() - raw.trim_start_matches([' ', '\t']).len();
        let body = &raw[width..];
        if body.trim_end().is_empty() {
            self.push(TokenKind::Newline, Position::new(line, 1, line_start));
            return Ok(());
        }
        if let Some(tab) = raw[..width].find('\t') {
            return Err(LexError {
                position: Position::new(line, tab + 1, line_start + tab),
                kind: LexErrorKind::TabIndent,
            });
        }
        let body_position = Position::new(line, width + 1, line_start + width);
        let end_position = Position::new(
            line,
            width + body.chars().count() + 1,
            line_start + raw.len(),
        );

        if let Some(text) = body.strip_prefix('#') {
            let text = text.trim_end().to_string();
            self.push(
                TokenKind::Comment {
                    text,
                    trailing: false,
                },
                body_position,
            );
            self.push(TokenKind::Newline, end_position);
            return Ok(());
        }

        self.indent_to(width, body_position)?;
        self.lex_tokens(body, body_position)?;
        self.push(TokenKind::Newline, end_position);
        Ok(())
    }

    fn indent_to(&mut self, width: usize, position: Position) -> Result<(), LexError> {
        if width % self.unit != 0 {
            return Err(LexError {
                position,
                kind: LexErrorKind::MisalignedIndent {
                    width,
                    unit: self.unit,
                },
            });
        }
        let mut current = self.stack.last().copied().unwrap_or(0);
        if width > current {
            self.stack.push(width);
            self.push(TokenKind::Indent(width), position);
            return Ok(());
        }
        while current > width {
            self.stack.pop();
            current = self.stack.last().copied().unwrap_or(0);
            if current < width {
                return Err(LexError {
                    position,
                    kind: LexErrorKind::InconsistentDedent { width },
                });
            }
            self.push(TokenKind::Dedent(current), position);
        }
        Ok(())
    }

    fn lex_tokens(&mut self, body: &str, start: Position) -> Result<(), LexError> {
        let mut chars = body.char_indices().peekable();
        let mut column = start.column;
        while let Some(&(i, c)) = chars.peek() {
            let position = Position::new(start.line, column, start.offset + i);
            match c {
                ' ' | '\t' => {
                    chars.next();
                    column += 1;
                }
                '#' => {
                    let text = body[i + 1..].trim_end().to_string();
                    self.push(
                        TokenKind::Comment {
                            text,
                            trailing: true,
                        },
                        position,
                    );
                    break;
                }
                ',' => {
                    chars.next();
                    column += 1;
                    self.push(TokenKind::Symbol(','), position);
                }
                '"' => {
                    chars.next();
                    column += 1;
                    let mut value = String::new();
                    let mut closed = false;
                    while let Some((_, c)) = chars.next() {
                        column += 1;
                        match c {
                            '"' => {
                                closed = true;
                                break;
                            }
                            '\\' => {
                                let Some((_, escaped)) = chars.next() else {
                                    break;
                                };
                                column += 1;
                                value.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    other => other,
                                });
                            }
                            _ => value.push(c),
                        }
                    }
                    if !closed {
                        return Err(LexError {
                            position,
                            kind: LexErrorKind::UnterminatedString,
                        });
                    }
                    self.push(TokenKind::StringLiteral(value), position);
                }
                c if is_word_char(c) => {
                    let mut end = i;
                    while let Some(&(j, c)) = chars.peek() {
                        if !is_word_char(c) {
                            break;
                        }
                        end = j + c.len_utf8();
                        chars.next();
                        column += 1;
                    }
                    self.push(classify(&body[i..end]), position);
                }
                other => {
                    return Err(LexError {
                        position,
                        kind: LexErrorKind::InvalidCharacter(other),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return Some(Ok(token));
            }
            if self.done {
                return None;
            }
            if self.offset >= self.source.len() {
                self.finish();
                continue;
            }
            if let Err(err) = self.lex_line() {
                self.queue.clear();
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '$')
}

fn classify(word: &str) -> TokenKind {
    if word.bytes().all(|b| b.is_ascii_digit()) {
        TokenKind::Number(word.to_string())
    } else if let Some(keyword) = Keyword::lookup(word) {
        TokenKind::Keyword(keyword)
    } else {
        TokenKind::Identifier(word.to_string())
    }
}

/// Lex the whole source eagerly.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Identifier(s.to_string())
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn indent_and_dedent_are_balanced() {
        let src = "domain A\n  command b\n    parameters\n      string x\n";
        let ks = kinds(src);
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword(Keyword::Domain),
                ident("A"),
                TokenKind::Newline,
                TokenKind::Indent(2),
                TokenKind::Keyword(Keyword::Command),
                ident("b"),
                TokenKind::Newline,
                TokenKind::Indent(4),
                TokenKind::Keyword(Keyword::Parameters),
                TokenKind::Newline,
                TokenKind::Indent(6),
                ident("string"),
                ident("x"),
                TokenKind::Newline,
                TokenKind::Dedent(4),
                TokenKind::Dedent(2),
                TokenKind::Dedent(0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines_do_not_change_indentation() {
        let src = "domain A\n\n      # deep comment\n  type T extends string\n";
        let ks = kinds(src);
        assert_eq!(ks[3], TokenKind::Newline);
        assert_eq!(
            ks[4],
            TokenKind::Comment {
                text: " deep comment".to_string(),
                trailing: false
            }
        );
        assert_eq!(ks[6], TokenKind::Indent(2));
    }

    #[test]
    fn trailing_comment_and_symbols() {
        let ks = kinds("domain A depends on B, C # note\n");
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword(Keyword::Domain),
                ident("A"),
                TokenKind::Keyword(Keyword::Depends),
                TokenKind::Keyword(Keyword::On),
                ident("B"),
                TokenKind::Symbol(','),
                ident("C"),
                TokenKind::Comment {
                    text: " note".to_string(),
                    trailing: true
                },
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_strings_and_dotted_names() {
        let ks = kinds("version 1 3\n\"a \\\"b\\\"\" DOM.NodeId 2d\n");
        assert_eq!(ks[1], TokenKind::Number("1".to_string()));
        assert_eq!(ks[2], TokenKind::Number("3".to_string()));
        assert_eq!(ks[4], TokenKind::StringLiteral("a \"b\"".to_string()));
        assert_eq!(ks[5], ident("DOM.NodeId"));
        assert_eq!(ks[6], ident("2d"));
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("domain A\n  type T extends string\n").expect("lex");
        let ty = tokens
            .iter()
            .find(|t| t.is_keyword(Keyword::Type))
            .expect("type token");
        assert_eq!(ty.position, Position::new(2, 3, 11));
        let base = tokens
            .iter()
            .find(|t| t.kind == ident("string"))
            .expect("base token");
        assert_eq!(base.position.column, 18);
    }

    #[test]
    fn crlf_line_endings() {
        let ks = kinds("domain A\r\n  command b\r\n");
        assert_eq!(ks[5], ident("b"));
        assert_eq!(ks[6], TokenKind::Newline);
    }

    #[test]
    fn tab_indentation_is_rejected() {
        let err = tokenize("domain A\n\tcommand b\n").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::TabIndent);
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 1);
    }

    #[test]
    fn whitespace_only_lines_are_blank() {
        let ks = kinds("domain A\n\t\n  \t \n  command b\n");
        assert_eq!(ks[3], TokenKind::Newline);
        assert_eq!(ks[4], TokenKind::Newline);
        assert_eq!(ks[5], TokenKind::Indent(2));
    }

    #[test]
    fn misaligned_indentation_is_rejected() {
        let err = tokenize("domain A\n   command b\n").unwrap_err();
        assert_eq!(
            err.kind,
            LexErrorKind::MisalignedIndent { width: 3, unit: 2 }
        );
    }

    #[test]
    fn dedent_to_unopened_width_is_rejected() {
        let err = tokenize("domain A\n    command b\n  event c\n").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InconsistentDedent { width: 2 });
        assert_eq!(err.position, Position::new(3, 3, 25));
    }

    #[test]
    fn invalid_character_is_rejected() {
        let err = tokenize("domain A;\n").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidCharacter(';'));
        assert_eq!(err.position.column, 9);
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let err = tokenize("  \"open\n").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.position.column, 3);
    }

    #[test]
    fn lexer_stops_after_error_and_restarts_on_reset() {
        let mut lexer = Lexer::new("domain A;\n");
        assert!(lexer.next().expect("item").is_err());
        assert!(lexer.next().is_none());

        let mut lexer = Lexer::new("domain A\n");
        let first: Vec<_> = lexer.by_ref().collect();
        lexer.reset();
        let second: Vec<_> = lexer.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn custom_indent_unit() {
        let mut lexer = Lexer::with_indent_unit("domain A\n    command b\n", 4);
        assert_eq!(lexer.indent_unit(), 4);
        let ks: Vec<_> = lexer.by_ref().map(|t| t.expect("lex").kind).collect();
        assert!(ks.contains(&TokenKind::Indent(4)));
    }
}
