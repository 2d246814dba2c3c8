//! Deterministic JSON rendering of a [`Document`].
//!
//! Key order is fixed by hand-written [`Serialize`] impls rather than by
//! struct field order, and optional fields (descriptions, `false` flags,
//! empty lists) are left out instead of being written as `null`. Converting
//! the same document twice yields identical bytes.

use std::io;

use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::config::{KeyStyle, Options};
use crate::document::{Command, Document, Domain, Event, Parameter, TypeDef, TypeSpec, Version};
use crate::error::Result;

/// Write `document` as pretty-printed JSON followed by a newline.
pub fn to_writer<W: io::Write>(
    mut writer: W,
    document: &Document,
    options: &Options,
) -> Result<()> {
    options.validate()?;
    let indent = " ".repeat(options.output_indent());
    {
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        Styled::new(document, options.key_style()).serialize(&mut serializer)?;
    }
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    Ok(())
}

pub fn to_string(document: &Document, options: &Options) -> Result<String> {
    let mut out = Vec::new();
    to_writer(&mut out, document, options)?;
    let text = String::from_utf8(out).map_err(serde_json::Error::custom)?;
    Ok(text)
}

/// The JSON tree, for callers that post-process it.
pub fn to_value(document: &Document, options: &Options) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(Styled::new(document, options.key_style()))?)
}

type EntryResult<M> = std::result::Result<(), <M as SerializeMap>::Error>;

/// A document node paired with the key style to render it with.
struct Styled<'a, T: ?Sized> {
    value: &'a T,
    style: KeyStyle,
}

impl<'a, T: ?Sized> Styled<'a, T> {
    fn new(value: &'a T, style: KeyStyle) -> Self {
        Styled { value, style }
    }

    fn with<U: ?Sized>(&self, value: &'a U) -> Styled<'a, U> {
        Styled::new(value, self.style)
    }

    fn id_key(&self, chromium: &'static str) -> &'static str {
        match self.style {
            KeyStyle::Canonical => "name",
            KeyStyle::Chromium => chromium,
        }
    }
}

impl<T> Serialize for Styled<'_, [T]>
where
    for<'b> Styled<'b, T>: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.value.iter().map(|item| self.with(item)))
    }
}

fn flags<M: SerializeMap>(map: &mut M, experimental: bool, deprecated: bool) -> EntryResult<M> {
    if experimental {
        map.serialize_entry("experimental", &true)?;
    }
    if deprecated {
        map.serialize_entry("deprecated", &true)?;
    }
    Ok(())
}

fn description<M: SerializeMap>(map: &mut M, text: &Option<String>) -> EntryResult<M> {
    if let Some(text) = text {
        map.serialize_entry("description", text)?;
    }
    Ok(())
}

fn list<M, T>(map: &mut M, key: &'static str, items: Styled<'_, [T]>) -> EntryResult<M>
where
    M: SerializeMap,
    for<'b> Styled<'b, T>: Serialize,
{
    if !items.value.is_empty() {
        map.serialize_entry(key, &items)?;
    }
    Ok(())
}

/// `$ref`, or `type` plus `items` / `enum` / `properties`.
fn type_fields<M: SerializeMap>(map: &mut M, spec: Styled<'_, TypeSpec>) -> EntryResult<M> {
    match spec.value {
        TypeSpec::Primitive(primitive) => map.serialize_entry("type", primitive.as_str()),
        TypeSpec::Named(name) => map.serialize_entry("$ref", name),
        TypeSpec::Enum(members) => {
            map.serialize_entry("type", "string")?;
            map.serialize_entry("enum", members)
        }
        TypeSpec::Object(properties) => {
            map.serialize_entry("type", "object")?;
            map.serialize_entry("properties", &spec.with(properties.as_slice()))
        }
        TypeSpec::Array(items) => {
            map.serialize_entry("type", "array")?;
            map.serialize_entry("items", &spec.with(items.as_ref()))
        }
    }
}

impl Serialize for Styled<'_, Document> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let doc = self.value;
        let mut map = serializer.serialize_map(None)?;
        description(&mut map, &doc.description)?;
        map.serialize_entry("version", &self.with(&doc.version))?;
        map.serialize_entry("domains", &self.with(doc.domains.as_slice()))?;
        map.end()
    }
}

impl Serialize for Styled<'_, Version> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let version = self.value;
        let mut map = serializer.serialize_map(Some(2))?;
        match self.style {
            KeyStyle::Canonical => {
                map.serialize_entry("major", &version.major)?;
                map.serialize_entry("minor", &version.minor)?;
            }
            KeyStyle::Chromium => {
                map.serialize_entry("major", &version.major.to_string())?;
                map.serialize_entry("minor", &version.minor.to_string())?;
            }
        }
        map.end()
    }
}

impl Serialize for Styled<'_, Domain> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let domain = self.value;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(self.id_key("domain"), &domain.name)?;
        description(&mut map, &domain.description)?;
        flags(&mut map, domain.experimental, domain.deprecated)?;
        if !domain.dependencies.is_empty() {
            map.serialize_entry("dependencies", &domain.dependencies)?;
        }
        list::<_, TypeDef>(&mut map, "types", self.with(domain.types.as_slice()))?;
        list::<_, Command>(&mut map, "commands", self.with(domain.commands.as_slice()))?;
        list::<_, Event>(&mut map, "events", self.with(domain.events.as_slice()))?;
        map.end()
    }
}

impl Serialize for Styled<'_, TypeDef> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let def = self.value;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(self.id_key("id"), &def.name)?;
        description(&mut map, &def.description)?;
        flags(&mut map, def.experimental, def.deprecated)?;
        type_fields(&mut map, self.with(&def.spec))?;
        map.end()
    }
}

impl Serialize for Styled<'_, Command> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let command = self.value;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &command.name)?;
        description(&mut map, &command.description)?;
        flags(&mut map, command.experimental, command.deprecated)?;
        if let Some(redirect) = &command.redirect {
            map.serialize_entry("redirect", redirect)?;
        }
        list::<_, Parameter>(&mut map, "parameters", self.with(command.parameters.as_slice()))?;
        list::<_, Parameter>(&mut map, "returns", self.with(command.returns.as_slice()))?;
        map.end()
    }
}

impl Serialize for Styled<'_, Event> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let event = self.value;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &event.name)?;
        description(&mut map, &event.description)?;
        flags(&mut map, event.experimental, event.deprecated)?;
        if let Some(redirect) = &event.redirect {
            map.serialize_entry("redirect", redirect)?;
        }
        list::<_, Parameter>(&mut map, "parameters", self.with(event.parameters.as_slice()))?;
        map.end()
    }
}

impl Serialize for Styled<'_, Parameter> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let parameter = self.value;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &parameter.name)?;
        description(&mut map, &parameter.description)?;
        flags(&mut map, parameter.experimental, parameter.deprecated)?;
        if parameter.optional {
            map.serialize_entry("optional", &true)?;
        }
        type_fields(&mut map, self.with(&parameter.spec))?;
        map.end()
    }
}

impl Serialize for Styled<'_, TypeSpec> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        type_fields(&mut map, self.with(self.value))?;
        map.end()
    }
}
