//! # pdl-json — DevTools protocol definition language to JSON
//!
//! Parses PDL, the indentation-structured text format the Chrome DevTools
//! protocol is written in, and renders it as deterministic JSON.
//!
//! ## Pipeline
//!
//! - [`lexer`]: lines to tokens, with `Indent`/`Dedent` for block structure
//! - [`parser`]: recursive descent from tokens to the [`ast`]
//! - [`normalize`]: flag inheritance and description text, giving a [`Document`]
//! - [`serialize`]: the [`Document`] as JSON with a fixed key order
//! - [`writer`]: the [`Document`] back to PDL text
//!
//! ## Example PDL
//!
//! ```text
//! version
//!   major 1
//!   minor 3
//!
//! # Actions and events related to the inspected page.
//! domain Page
//!   depends on DOM
//!
//!   type FrameId extends string
//!
//!   # Navigates current page to the given URL.
//!   experimental command navigate
//!     parameters
//!       # URL to navigate the page to.
//!       string url
//!       optional enum transitionType
//!         link
//!         typed
//!     returns
//!       FrameId frameId
//! ```
//!
//! ## Usage
//!
//! ```
//! let json = pdl_json::convert(
//!     "version 1 3\ndomain Page\n  command enable\n",
//!     &pdl_json::Options::default(),
//! )?;
//! assert!(json.contains("\"name\": \"enable\""));
//! # Ok::<(), pdl_json::Error>(())
//! ```

pub mod ast;
pub mod config;
pub mod document;
pub mod error;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod serialize;
pub mod writer;

use log::{debug, info};

pub use config::{DescriptionStyle, KeyStyle, Options};
pub use document::Document;
pub use error::{ConfigError, EmptyInputError, Error, LexError, ParseError, Position, Result};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::parse;
pub use writer::to_pdl;

/// Parse and normalize PDL source into a [`Document`].
pub fn load(source: &str, options: &Options) -> Result<Document> {
    options.validate()?;
    let protocol = parser::parse_with_indent_unit(source, options.indent_unit())?;
    Ok(normalize::normalize(protocol, options))
}

/// Convert PDL source to pretty-printed JSON text ending in a newline.
///
/// Nothing is produced unless the whole input is valid.
pub fn convert(source: &str, options: &Options) -> Result<String> {
    debug!(bytes = source.len(), indent_unit = options.indent_unit(); "Converting PDL");
    let document = load(source, options)?;
    let json = serialize::to_string(&document, options)?;
    info!(
        domains = document.domains.len(),
        bytes = json.len();
        "Converted PDL to JSON"
    );
    Ok(json)
}
