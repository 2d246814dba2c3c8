//! Conversion options.
//!
//! [`Options`] implements [`serde::Deserialize`] so it can be loaded from a
//! TOML table with [`Options::from_toml_str`]; every field is optional and
//! falls back to [`Options::default`].
//!
//! ```toml
//! indent_unit = 2
//! description_style = "folded"   # or "verbatim"
//! inherit_domain_flags = true
//! map_binary_to_string = false
//! key_style = "canonical"        # or "chromium"
//! output_indent = 4
//! ```

use serde::Deserialize;

use crate::error::ConfigError;
use crate::lexer::DEFAULT_INDENT_UNIT;

/// Largest accepted `output_indent`.
pub const MAX_OUTPUT_INDENT: usize = 16;

/// How comment lines become description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionStyle {
    /// Consecutive lines join with a space; a blank `#` line starts a new
    /// paragraph (`"\n\n"`).
    #[default]
    Folded,
    /// Lines join with `"\n"`, as written.
    Verbatim,
}

/// Field names used for identifiers in the JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStyle {
    /// `name` everywhere, integer version numbers.
    #[default]
    Canonical,
    /// Layout of the upstream `protocol.json`: `domain` for domains, `id` for
    /// types, version numbers as strings.
    Chromium,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Spaces per indentation level in the source.
    indent_unit: usize,
    description_style: DescriptionStyle,
    /// Domain `experimental`/`deprecated` become defaults for its members.
    inherit_domain_flags: bool,
    /// Render the `binary` primitive as `string`.
    map_binary_to_string: bool,
    key_style: KeyStyle,
    /// Spaces per nesting level in the JSON output.
    output_indent: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            indent_unit: DEFAULT_INDENT_UNIT,
            description_style: DescriptionStyle::Folded,
            inherit_domain_flags: true,
            map_binary_to_string: false,
            key_style: KeyStyle::Canonical,
            output_indent: 4,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    /// Options matching the upstream `pdl_to_json.py` output.
    pub fn chromium() -> Self {
        Options {
            description_style: DescriptionStyle::Verbatim,
            inherit_domain_flags: false,
            map_binary_to_string: true,
            key_style: KeyStyle::Chromium,
            ..Options::default()
        }
    }

    /// Load options from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML, unknown keys, an
    /// `indent_unit` of zero or an `output_indent` above [`MAX_OUTPUT_INDENT`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let options: Options = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent_unit == 0 {
            return Err(ConfigError::ZeroIndentUnit);
        }
        if self.output_indent > MAX_OUTPUT_INDENT {
            return Err(ConfigError::OutputIndentTooLarge {
                indent: self.output_indent,
                max: MAX_OUTPUT_INDENT,
            });
        }
        Ok(())
    }

    pub fn indent_unit(&self) -> usize {
        self.indent_unit
    }

    pub fn description_style(&self) -> DescriptionStyle {
        self.description_style
    }

    pub fn inherit_domain_flags(&self) -> bool {
        self.inherit_domain_flags
    }

    pub fn map_binary_to_string(&self) -> bool {
        self.map_binary_to_string
    }

    pub fn key_style(&self) -> KeyStyle {
        self.key_style
    }

    pub fn output_indent(&self) -> usize {
        self.output_indent
    }

    pub fn with_indent_unit(mut self, unit: usize) -> Self {
        self.indent_unit = unit;
        self
    }

    pub fn with_description_style(mut self, style: DescriptionStyle) -> Self {
        self.description_style = style;
        self
    }

    pub fn with_inherit_domain_flags(mut self, inherit: bool) -> Self {
        self.inherit_domain_flags = inherit;
        self
    }

    pub fn with_map_binary_to_string(mut self, map: bool) -> Self {
        self.map_binary_to_string = map;
        self
    }

    pub fn with_key_style(mut self, style: KeyStyle) -> Self {
        self.key_style = style;
        self
    }

    pub fn with_output_indent(mut self, indent: usize) -> Self {
        self.output_indent = indent;
        self
    }
}
