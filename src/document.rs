//! Canonical protocol document, ready for serialization.
//!
//! Produced by [`crate::normalize`]: descriptions are final text, flags are
//! resolved booleans and everything is in declaration order.

pub use crate::ast::{Primitive, Version};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub description: Option<String>,
    pub version: Version,
    pub domains: Vec<Domain>,
}

impl Document {
    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub name: String,
    pub description: Option<String>,
    pub experimental: bool,
    pub deprecated: bool,
    pub dependencies: Vec<String>,
    pub types: Vec<TypeDef>,
    pub commands: Vec<Command>,
    pub events: Vec<Event>,
}

impl Domain {
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub description: Option<String>,
    pub experimental: bool,
    pub deprecated: bool,
    pub spec: TypeSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub experimental: bool,
    pub deprecated: bool,
    /// Domain that actually implements this command.
    pub redirect: Option<String>,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub description: Option<String>,
    pub experimental: bool,
    pub deprecated: bool,
    pub redirect: Option<String>,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub description: Option<String>,
    pub experimental: bool,
    pub deprecated: bool,
    pub optional: bool,
    pub spec: TypeSpec,
}

impl Parameter {
    pub fn new(name: impl Into<String>, spec: TypeSpec) -> Self {
        Parameter {
            name: name.into(),
            description: None,
            experimental: false,
            deprecated: false,
            optional: false,
            spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Primitive(Primitive),
    Named(String),
    Enum(Vec<String>),
    Object(Vec<Parameter>),
    Array(Box<TypeSpec>),
}
