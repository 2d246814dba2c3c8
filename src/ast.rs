//! Abstract Syntax Tree for PDL, as written in the source.
//!
//! Comments are kept as raw lines (the text after `#`) and flags as declared;
//! [`crate::normalize`] turns this into the canonical [`crate::Document`].

use crate::error::Position;

/// Root of a parsed `.pdl` file.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    /// Comment block directly above the version declaration.
    pub comments: Vec<String>,
    pub version: Version,
    pub domains: Vec<Domain>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

/// `experimental` / `deprecated` markers written on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub experimental: bool,
    pub deprecated: bool,
}

impl Flags {
    pub fn merge(&mut self, other: Flags) {
        self.experimental |= other.experimental;
        self.deprecated |= other.deprecated;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub name: String,
    pub position: Position,
    pub comments: Vec<String>,
    pub flags: Flags,
    pub dependencies: Vec<String>,
    pub types: Vec<TypeDef>,
    pub commands: Vec<Command>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub comments: Vec<String>,
    pub flags: Flags,
    pub kind: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub comments: Vec<String>,
    pub flags: Flags,
    pub redirect: Option<String>,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub comments: Vec<String>,
    pub flags: Flags,
    pub redirect: Option<String>,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub comments: Vec<String>,
    pub flags: Flags,
    pub optional: bool,
    pub ty: TypeRef,
}

/// Type of a parameter, property or type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive(Primitive),
    /// Reference to a type by name (`FrameId`, `DOM.NodeId`); never resolved.
    Named(String),
    Enum(Vec<String>),
    Object(Vec<Parameter>),
    Array(Box<TypeRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    Number,
    Boolean,
    String,
    Object,
    Any,
    Array,
    Binary,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Primitive> {
        let primitive = match name {
            "integer" => Primitive::Integer,
            "number" => Primitive::Number,
            "boolean" => Primitive::Boolean,
            "string" => Primitive::String,
            "object" => Primitive::Object,
            "any" => Primitive::Any,
            "array" => Primitive::Array,
            "binary" => Primitive::Binary,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Object => "object",
            Primitive::Any => "any",
            Primitive::Array => "array",
            Primitive::Binary => "binary",
        }
    }
}

impl TypeRef {
    /// Classify a type word from the source.
    pub fn from_word(word: &str) -> TypeRef {
        match word {
            "enum" => TypeRef::Enum(Vec::new()),
            _ => match Primitive::from_name(word) {
                Some(primitive) => TypeRef::Primitive(primitive),
                None => TypeRef::Named(word.to_string()),
            },
        }
    }

    /// The type under any `array of` wrappers.
    pub fn innermost_mut(&mut self) -> &mut TypeRef {
        match self {
            TypeRef::Array(inner) => inner.innermost_mut(),
            other => other,
        }
    }
}
