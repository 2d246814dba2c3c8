//! Render a [`Document`] back to PDL text.
//!
//! Output uses two-space indentation, the block form of `version`, and
//! writes every flag explicitly, so parsing it again with default
//! [`crate::Options`] gives back an equal document.

use crate::document::{Command, Document, Domain, Event, Parameter, TypeDef, TypeSpec};
use crate::lexer::{Keyword, DEFAULT_INDENT_UNIT};

pub fn to_pdl(document: &Document) -> String {
    let mut out = Output::default();
    out.description(&document.description);
    out.line("version");
    out.depth += 1;
    out.line(&format!("major {}", document.version.major));
    out.line(&format!("minor {}", document.version.minor));
    out.depth -= 1;
    for domain in &document.domains {
        out.blank();
        out.domain(domain);
    }
    out.buf
}

#[derive(Default)]
struct Output {
    buf: String,
    depth: usize,
}

impl Output {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth * DEFAULT_INDENT_UNIT {
            self.buf.push(' ');
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn description(&mut self, description: &Option<String>) {
        let Some(text) = description else {
            return;
        };
        for line in text.split('\n') {
            if line.is_empty() {
                self.line("#");
            } else {
                self.line(&format!("# {}", line));
            }
        }
    }

    fn domain(&mut self, domain: &Domain) {
        self.description(&domain.description);
        self.line(&format!(
            "{}domain {}",
            flags(domain.experimental, domain.deprecated),
            domain.name
        ));
        self.depth += 1;
        for dependency in &domain.dependencies {
            self.line(&format!("depends on {}", dependency));
        }
        for def in &domain.types {
            self.blank();
            self.type_def(def);
        }
        for command in &domain.commands {
            self.blank();
            self.command(command);
        }
        for event in &domain.events {
            self.blank();
            self.event(event);
        }
        self.depth -= 1;
    }

    fn type_def(&mut self, def: &TypeDef) {
        self.description(&def.description);
        let base = match &def.spec {
            TypeSpec::Enum(_) => "string".to_string(),
            spec => type_word(spec),
        };
        self.line(&format!(
            "{}type {} extends {}",
            flags(def.experimental, def.deprecated),
            def.name,
            base
        ));
        self.depth += 1;
        match &def.spec {
            TypeSpec::Enum(members) => {
                self.line(Keyword::Enum.as_str());
                self.members(members);
            }
            TypeSpec::Object(properties) => {
                self.line(Keyword::Properties.as_str());
                self.parameters(properties);
            }
            _ => {}
        }
        self.depth -= 1;
    }

    fn command(&mut self, command: &Command) {
        self.description(&command.description);
        self.line(&format!(
            "{}command {}",
            flags(command.experimental, command.deprecated),
            command.name
        ));
        self.depth += 1;
        self.redirect(&command.redirect);
        self.parameter_block(Keyword::Parameters, &command.parameters);
        self.parameter_block(Keyword::Returns, &command.returns);
        self.depth -= 1;
    }

    fn event(&mut self, event: &Event) {
        self.description(&event.description);
        self.line(&format!(
            "{}event {}",
            flags(event.experimental, event.deprecated),
            event.name
        ));
        self.depth += 1;
        self.redirect(&event.redirect);
        self.parameter_block(Keyword::Parameters, &event.parameters);
        self.depth -= 1;
    }

    fn redirect(&mut self, redirect: &Option<String>) {
        if let Some(target) = redirect {
            self.line(&format!("redirect {}", target));
        }
    }

    fn parameter_block(&mut self, keyword: Keyword, parameters: &[Parameter]) {
        if parameters.is_empty() {
            return;
        }
        self.line(keyword.as_str());
        self.parameters(parameters);
    }

    fn parameters(&mut self, parameters: &[Parameter]) {
        self.depth += 1;
        for parameter in parameters {
            self.parameter(parameter);
        }
        self.depth -= 1;
    }

    fn parameter(&mut self, parameter: &Parameter) {
        self.description(&parameter.description);
        let optional = if parameter.optional { "optional " } else { "" };
        self.line(&format!(
            "{}{}{} {}",
            flags(parameter.experimental, parameter.deprecated),
            optional,
            type_word(&parameter.spec),
            parameter.name
        ));
        match innermost(&parameter.spec) {
            TypeSpec::Enum(members) => self.members(members),
            TypeSpec::Object(properties) => self.parameters(properties),
            _ => {}
        }
    }

    fn members(&mut self, members: &[String]) {
        self.depth += 1;
        for member in members {
            self.line(&enum_member(member));
        }
        self.depth -= 1;
    }
}

fn flags(experimental: bool, deprecated: bool) -> &'static str {
    match (experimental, deprecated) {
        (false, false) => "",
        (true, false) => "experimental ",
        (false, true) => "deprecated ",
        (true, true) => "experimental deprecated ",
    }
}

fn type_word(spec: &TypeSpec) -> String {
    match spec {
        TypeSpec::Primitive(primitive) => primitive.as_str().to_string(),
        TypeSpec::Named(name) => name.clone(),
        TypeSpec::Enum(_) => "enum".to_string(),
        TypeSpec::Object(_) => "object".to_string(),
        TypeSpec::Array(inner) => format!("array of {}", type_word(inner)),
    }
}

fn innermost(spec: &TypeSpec) -> &TypeSpec {
    match spec {
        TypeSpec::Array(inner) => innermost(inner),
        other => other,
    }
}

/// Bare word when the lexer reads it back as one token, quoted otherwise.
fn enum_member(member: &str) -> String {
    let plain = !member.is_empty()
        && member
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '$'));
    if plain {
        return member.to_string();
    }
    let mut quoted = String::with_capacity(member.len() + 2);
    quoted.push('"');
    for c in member.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
