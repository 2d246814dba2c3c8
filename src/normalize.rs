//! Semantic normalization: AST to canonical [`Document`].
//!
//! - domain flags become defaults for the domain's types, commands and events
//! - comment lines become description text
//! - `binary` optionally maps to `string`
//! - repeated dependency names are dropped
//!
//! Declaration order is kept as is; nothing is sorted.

use log::debug;

use crate::ast;
use crate::config::{DescriptionStyle, Options};
use crate::document::{Command, Document, Domain, Event, Parameter, Primitive, TypeDef, TypeSpec};

pub fn normalize(protocol: ast::Protocol, options: &Options) -> Document {
    let n = Normalizer { options };
    let document = Document {
        description: n.describe(&protocol.comments),
        version: protocol.version,
        domains: protocol.domains.into_iter().map(|d| n.domain(d)).collect(),
    };
    debug!(domains = document.domains.len(); "Normalized document");
    document
}

struct Normalizer<'a> {
    options: &'a Options,
}

impl Normalizer<'_> {
    fn domain(&self, domain: ast::Domain) -> Domain {
        let inherited = if self.options.inherit_domain_flags() {
            domain.flags
        } else {
            ast::Flags::default()
        };
        let flags = |mut own: ast::Flags| {
            own.merge(inherited);
            own
        };

        let mut dependencies: Vec<String> = Vec::with_capacity(domain.dependencies.len());
        for name in domain.dependencies {
            if !dependencies.contains(&name) {
                dependencies.push(name);
            }
        }

        Domain {
            description: self.describe(&domain.comments),
            experimental: domain.flags.experimental,
            deprecated: domain.flags.deprecated,
            dependencies,
            types: domain
                .types
                .into_iter()
                .map(|t| {
                    let f = flags(t.flags);
                    TypeDef {
                        description: self.describe(&t.comments),
                        experimental: f.experimental,
                        deprecated: f.deprecated,
                        spec: self.spec(t.kind),
                        name: t.name,
                    }
                })
                .collect(),
            commands: domain
                .commands
                .into_iter()
                .map(|c| {
                    let f = flags(c.flags);
                    Command {
                        description: self.describe(&c.comments),
                        experimental: f.experimental,
                        deprecated: f.deprecated,
                        redirect: c.redirect,
                        parameters: self.parameters(c.parameters),
                        returns: self.parameters(c.returns),
                        name: c.name,
                    }
                })
                .collect(),
            events: domain
                .events
                .into_iter()
                .map(|e| {
                    let f = flags(e.flags);
                    Event {
                        description: self.describe(&e.comments),
                        experimental: f.experimental,
                        deprecated: f.deprecated,
                        redirect: e.redirect,
                        parameters: self.parameters(e.parameters),
                        name: e.name,
                    }
                })
                .collect(),
            name: domain.name,
        }
    }

    fn parameters(&self, parameters: Vec<ast::Parameter>) -> Vec<Parameter> {
        parameters.into_iter().map(|p| self.parameter(p)).collect()
    }

    fn parameter(&self, parameter: ast::Parameter) -> Parameter {
        Parameter {
            description: self.describe(&parameter.comments),
            experimental: parameter.flags.experimental,
            deprecated: parameter.flags.deprecated,
            optional: parameter.optional,
            spec: self.spec(parameter.ty),
            name: parameter.name,
        }
    }

    fn spec(&self, ty: ast::TypeRef) -> TypeSpec {
        match ty {
            ast::TypeRef::Primitive(Primitive::Binary) if self.options.map_binary_to_string() => {
                TypeSpec::Primitive(Primitive::String)
            }
            ast::TypeRef::Primitive(primitive) => TypeSpec::Primitive(primitive),
            ast::TypeRef::Named(name) => TypeSpec::Named(name),
            ast::TypeRef::Enum(members) => TypeSpec::Enum(members),
            ast::TypeRef::Object(properties) => TypeSpec::Object(self.parameters(properties)),
            ast::TypeRef::Array(inner) => TypeSpec::Array(Box::new(self.spec(*inner))),
        }
    }

    fn describe(&self, lines: &[String]) -> Option<String> {
        describe(lines, self.options.description_style())
    }
}

/// Turn raw comment lines (text after `#`) into description text.
pub fn describe(lines: &[String], style: DescriptionStyle) -> Option<String> {
    let stripped = lines
        .iter()
        .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end());

    let text = match style {
        DescriptionStyle::Verbatim => stripped.collect::<Vec<_>>().join("\n").trim().to_string(),
        DescriptionStyle::Folded => {
            let mut paragraphs: Vec<String> = Vec::new();
            let mut current = String::new();
            for line in stripped {
                let line = line.trim();
                if line.is_empty() {
                    if !current.is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    continue;
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(line);
            }
            if !current.is_empty() {
                paragraphs.push(current);
            }
            paragraphs.join("\n\n")
        }
    };
    (!text.is_empty()).then_some(text)
}
