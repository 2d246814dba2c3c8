//! Recursive-descent parser from PDL tokens to the AST.
//!
//! One method per grammar construct. Blocks are delimited by the lexer's
//! `Indent`/`Dedent` tokens; every line rule consumes its own trailing
//! `Newline`, so a `Newline` seen between lines is a blank line.
//!
//! Comment lines accumulate in a single pending slot on the parser. A
//! declaration takes the slot as its description; a blank line or any other
//! non-comment line empties it.

use log::{debug, trace};

use crate::ast::{
    Command, Domain, Event, Flags, Parameter, Primitive, Protocol, TypeDef, TypeRef, Version,
};
use crate::error::{EmptyInputError, Error, ParseError, Position, Result};
use crate::lexer::{Keyword, Lexer, Token, TokenKind, DEFAULT_INDENT_UNIT};

/// Parse PDL source into the AST.
pub fn parse(source: &str) -> Result<Protocol> {
    parse_with_indent_unit(source, DEFAULT_INDENT_UNIT)
}

/// Parse PDL source whose blocks are indented by `unit` spaces.
pub fn parse_with_indent_unit(source: &str, unit: usize) -> Result<Protocol> {
    Parser::new(Lexer::with_indent_unit(source, unit)).parse_document()
}

/// Deepest `array of` chain, and deepest block, the parser accepts.
pub const MAX_NESTING: usize = 32;

/// Body of a `command` or `event` before it is split by kind.
struct Operation {
    name: String,
    position: Position,
    comments: Vec<String>,
    flags: Flags,
    redirect: Option<String>,
    parameters: Vec<Parameter>,
    returns: Vec<Parameter>,
}

enum TypeBody {
    Enum(Vec<String>),
    Properties(Vec<Parameter>),
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Token>,
    eof: Position,
    pending: Vec<String>,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>) -> Self {
        Parser {
            lexer,
            lookahead: None,
            eof: Position::default(),
            pending: Vec::new(),
            depth: 0,
        }
    }

    // ==================== Token plumbing ====================

    fn next_token(&mut self) -> Result<Token> {
        match self.lexer.next() {
            Some(Ok(token)) => {
                if token.kind == TokenKind::Eof {
                    self.eof = token.position;
                }
                Ok(token)
            }
            Some(Err(err)) => Err(err.into()),
            None => Ok(Token {
                kind: TokenKind::Eof,
                position: self.eof,
            }),
        }
    }

    fn peek(&mut self) -> Result<&Token> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.next_token()?,
        };
        Ok(&*self.lookahead.insert(token))
    }

    fn bump(&mut self) -> Result<Token> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.next_token(),
        }
    }

    fn at_keyword(&mut self, keyword: Keyword) -> Result<bool> {
        Ok(self.peek()?.is_keyword(keyword))
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> Result<bool> {
        if self.at_keyword(keyword)? {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_symbol(&mut self, symbol: char) -> Result<bool> {
        if self.peek()?.kind == TokenKind::Symbol(symbol) {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Error naming what was expected at the current token.
    fn unexpected(&mut self, what: &str) -> Error {
        match self.peek() {
            Ok(token) => ParseError::expected(token.position, what, &token.kind).into(),
            Err(err) => err,
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Position> {
        if self.at_keyword(keyword)? {
            return Ok(self.bump()?.position);
        }
        Err(self.unexpected(&format!("`{}`", keyword.as_str())))
    }

    /// Names may be identifiers or keywords used as plain words.
    fn expect_name(&mut self, what: &str) -> Result<(String, Position)> {
        let token = self.peek()?.clone();
        let name = match token.kind {
            TokenKind::Identifier(name) => name,
            TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
            other => return Err(ParseError::expected(token.position, what, other).into()),
        };
        self.bump()?;
        Ok((name, token.position))
    }

    fn expect_number(&mut self, what: &str) -> Result<u32> {
        let token = self.peek()?.clone();
        let text = match token.kind {
            TokenKind::Number(text) => text,
            other => return Err(ParseError::expected(token.position, what, other).into()),
        };
        self.bump()?;
        text.parse::<u32>().map_err(|_| {
            Error::from(ParseError::new(
                token.position,
                format!("{} {} is out of range", what, text),
            ))
        })
    }

    /// Finish a line: optional trailing comment, then `Newline`.
    fn end_line(&mut self) -> Result<Option<String>> {
        let mut trailing = None;
        let token = self.peek()?.clone();
        if let TokenKind::Comment {
            text,
            trailing: true,
        } = token.kind
        {
            trailing = Some(text);
            self.bump()?;
        }
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Newline => {
                self.bump()?;
                Ok(trailing)
            }
            TokenKind::Eof => Ok(trailing),
            other => Err(ParseError::expected(token.position, "end of line", other).into()),
        }
    }

    /// Consume comment lines into the pending slot; a blank line empties it.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::Comment { text, .. } => {
                    self.bump()?;
                    self.pending.push(text);
                    self.end_line()?;
                }
                TokenKind::Newline => {
                    self.bump()?;
                    if !self.pending.is_empty() {
                        trace!(line = token.position.line; "blank line detaches comment block");
                    }
                    self.pending.clear();
                }
                _ => return Ok(()),
            }
        }
    }

    fn take_comments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    /// Parse an optional block one indentation level below the current one.
    ///
    /// Returns `false` (consuming nothing but trivia) when the next line is
    /// not indented.
    fn block(&mut self, mut item: impl FnMut(&mut Self) -> Result<()>) -> Result<bool> {
        self.skip_trivia()?;
        let token = self.peek()?.clone();
        let TokenKind::Indent(width) = token.kind else {
            return Ok(false);
        };
        let expected = (self.depth + 1) * self.lexer.indent_unit();
        if width != expected {
            return Err(ParseError::new(
                token.position,
                format!(
                    "inconsistent indentation: expected {} spaces, found {}",
                    expected, width
                ),
            )
            .into());
        }
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(token.position, "blocks nested too deep").into());
        }
        self.bump()?;
        self.depth += 1;
        loop {
            self.skip_trivia()?;
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::Dedent(_) => {
                    self.bump()?;
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Indent(_) => {
                    return Err(ParseError::new(token.position, "unexpected indentation").into());
                }
                _ => item(self)?,
            }
        }
        self.depth -= 1;
        Ok(true)
    }

    // ==================== Grammar ====================

    /// `comments? version domain*`
    pub fn parse_document(&mut self) -> Result<Protocol> {
        self.skip_trivia()?;
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Keyword(Keyword::Version) => {}
            TokenKind::Eof
            | TokenKind::Keyword(Keyword::Domain)
            | TokenKind::Keyword(Keyword::Experimental)
            | TokenKind::Keyword(Keyword::Deprecated) => {
                return Err(EmptyInputError::MissingVersion.into());
            }
            _ => return Err(self.unexpected("version declaration")),
        }
        let comments = self.take_comments();
        let version = self.parse_version()?;

        let mut domains: Vec<Domain> = Vec::new();
        loop {
            self.skip_trivia()?;
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Keyword(Keyword::Version) => {
                    return Err(
                        ParseError::new(token.position, "duplicate version declaration").into(),
                    );
                }
                TokenKind::Indent(_) => {
                    return Err(ParseError::new(token.position, "unexpected indentation").into());
                }
                _ => {
                    let domain = self.parse_domain()?;
                    if domains.iter().any(|d| d.name == domain.name) {
                        return Err(ParseError::new(
                            domain.position,
                            format!("duplicate domain `{}`", domain.name),
                        )
                        .into());
                    }
                    domains.push(domain);
                }
            }
        }
        if domains.is_empty() {
            return Err(EmptyInputError::NoDomains.into());
        }
        debug!(domains = domains.len(); "Parsed protocol");
        Ok(Protocol {
            comments,
            version,
            domains,
        })
    }

    /// `version MAJOR MINOR`, or `version` with an indented `major N` / `minor N` block.
    fn parse_version(&mut self) -> Result<Version> {
        self.pending.clear();
        let start = self.expect_keyword(Keyword::Version)?;
        if matches!(self.peek()?.kind, TokenKind::Number(_)) {
            let major = self.expect_number("major version")?;
            let minor = self.expect_number("minor version")?;
            self.end_line()?;
            return Ok(Version { major, minor });
        }
        self.end_line()?;

        let mut major = None;
        let mut minor = None;
        self.block(|p| {
            p.pending.clear();
            let token = p.bump()?;
            let (slot, which) = match token.kind {
                TokenKind::Keyword(Keyword::Major) => (&mut major, "major"),
                TokenKind::Keyword(Keyword::Minor) => (&mut minor, "minor"),
                other => {
                    return Err(
                        ParseError::expected(token.position, "`major` or `minor`", other).into(),
                    );
                }
            };
            if slot.is_some() {
                return Err(ParseError::new(
                    token.position,
                    format!("duplicate `{}` in version declaration", which),
                )
                .into());
            }
            *slot = Some(p.expect_number(&format!("{} version", which))?);
            p.end_line()?;
            Ok(())
        })?;

        match (major, minor) {
            (Some(major), Some(minor)) => Ok(Version { major, minor }),
            (None, _) => {
                Err(ParseError::new(start, "version declaration is missing `major`").into())
            }
            (_, None) => {
                Err(ParseError::new(start, "version declaration is missing `minor`").into())
            }
        }
    }

    fn parse_flags(&mut self) -> Result<Flags> {
        let mut flags = Flags::default();
        loop {
            if self.eat_keyword(Keyword::Experimental)? {
                flags.experimental = true;
            } else if self.eat_keyword(Keyword::Deprecated)? {
                flags.deprecated = true;
            } else {
                return Ok(flags);
            }
        }
    }

    /// `depends on A, B`
    fn parse_depends(&mut self) -> Result<Vec<String>> {
        self.expect_keyword(Keyword::Depends)?;
        self.expect_keyword(Keyword::On)?;
        let mut names = vec![self.expect_name("domain name")?.0];
        while self.eat_symbol(',')? {
            names.push(self.expect_name("domain name")?.0);
        }
        Ok(names)
    }

    /// `flags? domain NAME flags? (depends on NAMES)?` followed by the domain block.
    fn parse_domain(&mut self) -> Result<Domain> {
        let mut comments = self.take_comments();
        let mut flags = self.parse_flags()?;
        self.expect_keyword(Keyword::Domain)?;
        let (name, position) = self.expect_name("domain name")?;
        flags.merge(self.parse_flags()?);
        let mut dependencies = Vec::new();
        if self.at_keyword(Keyword::Depends)? {
            dependencies = self.parse_depends()?;
        }
        comments.extend(self.end_line()?);

        let mut domain = Domain {
            name,
            position,
            comments,
            flags,
            dependencies,
            types: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
        };
        self.block(|p| p.parse_domain_item(&mut domain))?;
        trace!(
            domain = domain.name.as_str(),
            types = domain.types.len(),
            commands = domain.commands.len(),
            events = domain.events.len();
            "Parsed domain"
        );
        Ok(domain)
    }

    fn parse_domain_item(&mut self, domain: &mut Domain) -> Result<()> {
        if self.at_keyword(Keyword::Depends)? {
            self.pending.clear();
            let names = self.parse_depends()?;
            self.end_line()?;
            domain.dependencies.extend(names);
            return Ok(());
        }
        let comments = self.take_comments();
        let flags = self.parse_flags()?;
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Keyword(Keyword::Type) => {
                let (def, position) = self.parse_type(comments, flags)?;
                if domain.types.iter().any(|t| t.name == def.name) {
                    return Err(duplicate(position, "type", &def.name, &domain.name));
                }
                domain.types.push(def);
            }
            TokenKind::Keyword(Keyword::Command) => {
                let op = self.parse_operation(Keyword::Command, comments, flags)?;
                if domain.commands.iter().any(|c| c.name == op.name) {
                    return Err(duplicate(op.position, "command", &op.name, &domain.name));
                }
                domain.commands.push(Command {
                    name: op.name,
                    comments: op.comments,
                    flags: op.flags,
                    redirect: op.redirect,
                    parameters: op.parameters,
                    returns: op.returns,
                });
            }
            TokenKind::Keyword(Keyword::Event) => {
                let op = self.parse_operation(Keyword::Event, comments, flags)?;
                if domain.events.iter().any(|e| e.name == op.name) {
                    return Err(duplicate(op.position, "event", &op.name, &domain.name));
                }
                domain.events.push(Event {
                    name: op.name,
                    comments: op.comments,
                    flags: op.flags,
                    redirect: op.redirect,
                    parameters: op.parameters,
                });
            }
            other => {
                return Err(ParseError::expected(
                    token.position,
                    "`type`, `command`, `event` or `depends on`",
                    other,
                )
                .into());
            }
        }
        Ok(())
    }

    /// `type NAME extends BASE flags?` with an optional `enum` or `properties` block.
    fn parse_type(
        &mut self,
        mut comments: Vec<String>,
        mut flags: Flags,
    ) -> Result<(TypeDef, Position)> {
        self.expect_keyword(Keyword::Type)?;
        let (name, position) = self.expect_name("type name")?;
        self.expect_keyword(Keyword::Extends)?;
        let mut kind = self.parse_type_word("base type")?;
        flags.merge(self.parse_flags()?);
        comments.extend(self.end_line()?);

        let mut body: Option<(Position, TypeBody)> = None;
        self.block(|p| {
            p.pending.clear();
            let token = p.bump()?;
            let parsed = match token.kind {
                TokenKind::Keyword(Keyword::Enum) | TokenKind::Keyword(Keyword::Properties)
                    if body.is_some() =>
                {
                    return Err(ParseError::new(
                        token.position,
                        "type already has an `enum` or `properties` block",
                    )
                    .into());
                }
                TokenKind::Keyword(Keyword::Enum) => {
                    p.end_line()?;
                    TypeBody::Enum(p.parse_enum_members()?)
                }
                TokenKind::Keyword(Keyword::Properties) => {
                    p.end_line()?;
                    TypeBody::Properties(p.parse_parameter_block()?.unwrap_or_default())
                }
                other => {
                    return Err(ParseError::expected(
                        token.position,
                        "`enum` or `properties`",
                        other,
                    )
                    .into());
                }
            };
            body = Some((token.position, parsed));
            Ok(())
        })?;

        match body {
            None => {}
            Some((at, TypeBody::Enum(members))) => match kind {
                TypeRef::Primitive(Primitive::String) | TypeRef::Enum(_) => {
                    kind = TypeRef::Enum(members);
                }
                _ => {
                    return Err(ParseError::new(at, "`enum` requires `extends string`").into());
                }
            },
            Some((at, TypeBody::Properties(properties))) => match kind {
                TypeRef::Primitive(Primitive::Object) => kind = TypeRef::Object(properties),
                _ => {
                    return Err(
                        ParseError::new(at, "`properties` requires `extends object`").into(),
                    );
                }
            },
        }

        Ok((
            TypeDef {
                name,
                comments,
                flags,
                kind,
            },
            position,
        ))
    }

    /// `command|event NAME flags? (redirect TARGET)?` with an optional block of
    /// `redirect`, `parameters` and (commands only) `returns`.
    fn parse_operation(
        &mut self,
        keyword: Keyword,
        mut comments: Vec<String>,
        mut flags: Flags,
    ) -> Result<Operation> {
        self.expect_keyword(keyword)?;
        let (name, position) = self.expect_name(&format!("{} name", keyword.as_str()))?;
        flags.merge(self.parse_flags()?);
        let mut redirect = None;
        if self.eat_keyword(Keyword::Redirect)? {
            redirect = Some(self.expect_name("redirect target")?.0);
        }
        comments.extend(self.end_line()?);

        let mut parameters = None;
        let mut returns = None;
        let accepts_returns = keyword == Keyword::Command;
        self.block(|p| {
            p.pending.clear();
            let token = p.bump()?;
            match token.kind {
                TokenKind::Keyword(Keyword::Redirect) => {
                    if redirect.is_some() {
                        return Err(ParseError::new(token.position, "duplicate `redirect`").into());
                    }
                    redirect = Some(p.expect_name("redirect target")?.0);
                    p.end_line()?;
                }
                TokenKind::Keyword(Keyword::Parameters) => {
                    if parameters.is_some() {
                        return Err(
                            ParseError::new(token.position, "duplicate `parameters` block").into(),
                        );
                    }
                    p.end_line()?;
                    parameters = Some(p.parse_parameter_block()?.unwrap_or_default());
                }
                TokenKind::Keyword(Keyword::Returns) if accepts_returns => {
                    if returns.is_some() {
                        return Err(
                            ParseError::new(token.position, "duplicate `returns` block").into(),
                        );
                    }
                    p.end_line()?;
                    returns = Some(p.parse_parameter_block()?.unwrap_or_default());
                }
                TokenKind::Keyword(Keyword::Returns) => {
                    return Err(
                        ParseError::new(token.position, "events cannot declare `returns`").into(),
                    );
                }
                other => {
                    let what = if accepts_returns {
                        "`parameters`, `returns` or `redirect`"
                    } else {
                        "`parameters` or `redirect`"
                    };
                    return Err(ParseError::expected(token.position, what, other).into());
                }
            }
            Ok(())
        })?;

        Ok(Operation {
            name,
            position,
            comments,
            flags,
            redirect,
            parameters: parameters.unwrap_or_default(),
            returns: returns.unwrap_or_default(),
        })
    }

    /// `(array of)* WORD`; a bare `array` is the primitive.
    fn parse_type_word(&mut self, what: &str) -> Result<TypeRef> {
        let mut wrappers = 0;
        let mut ty = loop {
            let position = self.peek()?.position;
            if !self.eat_keyword(Keyword::Array)? {
                let (word, _) = self.expect_name(what)?;
                break TypeRef::from_word(&word);
            }
            if !self.eat_keyword(Keyword::Of)? {
                break TypeRef::Primitive(Primitive::Array);
            }
            wrappers += 1;
            if wrappers > MAX_NESTING {
                return Err(ParseError::new(position, "array nesting too deep").into());
            }
        };
        for _ in 0..wrappers {
            ty = TypeRef::Array(Box::new(ty));
        }
        Ok(ty)
    }

    /// Indented block of parameter lines, `None` when there is no block.
    fn parse_parameter_block(&mut self) -> Result<Option<Vec<Parameter>>> {
        let mut parameters = Vec::new();
        let present = self.block(|p| {
            parameters.push(p.parse_parameter()?);
            Ok(())
        })?;
        Ok(present.then_some(parameters))
    }

    /// `(experimental|deprecated|optional)* TYPE NAME`, plus the member block of
    /// an inline `enum` or the property block of an inline `object`.
    fn parse_parameter(&mut self) -> Result<Parameter> {
        let mut comments = self.take_comments();
        let mut flags = Flags::default();
        let mut optional = false;
        loop {
            if self.eat_keyword(Keyword::Experimental)? {
                flags.experimental = true;
            } else if self.eat_keyword(Keyword::Deprecated)? {
                flags.deprecated = true;
            } else if self.eat_keyword(Keyword::Optional)? {
                optional = true;
            } else {
                break;
            }
        }
        let mut ty = self.parse_type_word("parameter type")?;
        let (name, _) = self.expect_name("parameter name")?;
        comments.extend(self.end_line()?);

        let inner = ty.innermost_mut();
        if let TypeRef::Enum(members) = &mut *inner {
            *members = self.parse_enum_members()?;
        } else if *inner == TypeRef::Primitive(Primitive::Object) {
            if let Some(properties) = self.parse_parameter_block()? {
                *inner = TypeRef::Object(properties);
            }
        }

        Ok(Parameter {
            name,
            comments,
            flags,
            optional,
            ty,
        })
    }

    /// Indented list of enum members, one per line.
    fn parse_enum_members(&mut self) -> Result<Vec<String>> {
        let mut members = Vec::new();
        self.block(|p| {
            p.pending.clear();
            let token = p.bump()?;
            let member = match token.kind {
                TokenKind::Identifier(text)
                | TokenKind::StringLiteral(text)
                | TokenKind::Number(text) => text,
                TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
                other => {
                    return Err(ParseError::expected(token.position, "enum member", other).into());
                }
            };
            p.end_line()?;
            members.push(member);
            Ok(())
        })?;
        Ok(members)
    }
}

fn duplicate(position: Position, what: &str, name: &str, domain: &str) -> Error {
    ParseError::new(
        position,
        format!("duplicate {} `{}` in domain `{}`", what, name, domain),
    )
    .into()
}
