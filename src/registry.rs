//! Type registry — per-language templates and default vocabularies
//!
//! A type definition looks like:
//!
//! ```yaml
//! CONNECTEDNESS:
//!   R:
//!     HEADER: "%I%"
//!     INCONV:
//!       IN: "%I% <- as.connectedness(%I%)"
//!   Python:
//!     PY_TYPE: Connectedness
//!   DEFAULT:
//!     WEAK:
//!       R: '"weak"'
//!       Python: Connectedness.WEAK
//! ```
//!
//! Keys other than `DEFAULT` and `FLAGS` are language tags mapping to that
//! language's template table. A template entry is either a single string or
//! a mapping keyed by parameter mode (`IN`/`OUT`/`INOUT`). The `DEFAULT`
//! vocabulary is what lets one symbolic default render to a different
//! literal per target language.

use std::collections::BTreeSet;

use serde_norway::{Mapping, Value};

use crate::error::{Error, Result};
use crate::params::ParamMode;

/// Describes a single abstract type used by function definitions.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    /// Lowercased symbolic tags (`by_ref`, ...).
    pub flags: BTreeSet<String>,
    /// Language tag to template table, in declaration order.
    templates: Mapping,
    /// Symbolic default name to per-language literal mapping.
    defaults: Mapping,
}

impl TypeDescriptor {
    fn from_properties(name: &str, properties: &Mapping) -> Result<Self> {
        let mut flags = BTreeSet::new();
        let mut templates = Mapping::new();
        let mut defaults = Mapping::new();

        for (key, value) in properties {
            match key.as_str() {
                Some("DEFAULT") => {
                    defaults = value
                        .as_mapping()
                        .cloned()
                        .ok_or_else(|| {
                            Error::Other(format!("`DEFAULT` of type {name} must be a mapping"))
                        })?;
                }
                Some("FLAGS") => {
                    flags = flag_list(name, value)?;
                }
                Some(_) => {
                    templates.insert(key.clone(), value.clone());
                }
                None => {
                    return Err(Error::Other(format!(
                        "property keys of type {name} must be strings"
                    )))
                }
            }
        }

        Ok(TypeDescriptor {
            name: name.to_string(),
            flags,
            templates,
            defaults,
        })
    }

    /// Checks a flag in a case-insensitive manner.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag.to_lowercase())
    }

    /// Whether values of this type cross the C boundary by reference.
    pub fn is_passed_by_reference(&self) -> bool {
        self.has_flag("by_ref")
    }

    /// Plain string template entry for a language, e.g. `HEADER` or `CALL`.
    ///
    /// Returns `None` when the entry is absent or mode-keyed; an empty
    /// string is a valid template (it suppresses the emission site).
    pub fn template(&self, language: &str, key: &str) -> Option<&str> {
        self.template_entry(language, key).and_then(Value::as_str)
    }

    /// Template entry that may be a single string (applies to every mode) or
    /// a mapping keyed by `IN`/`OUT`/`INOUT`.
    pub fn template_for_mode(&self, language: &str, key: &str, mode: ParamMode) -> Option<&str> {
        match self.template_entry(language, key)? {
            Value::String(text) => Some(text.as_str()),
            Value::Mapping(by_mode) => by_mode.get(mode.as_str()).and_then(Value::as_str),
            _ => None,
        }
    }

    /// `INCONV` template for a parameter mode.
    ///
    /// A plain-string entry is an input conversion only; it never applies
    /// to pure `OUT` parameters, which need an explicit mode-keyed entry
    /// to construct their buffer.
    pub fn input_conversion(&self, language: &str, mode: ParamMode) -> Option<&str> {
        match self.template_entry(language, "INCONV")? {
            Value::String(text) if mode.is_input() => Some(text.as_str()),
            Value::Mapping(by_mode) => by_mode.get(mode.as_str()).and_then(Value::as_str),
            _ => None,
        }
    }

    fn template_entry(&self, language: &str, key: &str) -> Option<&Value> {
        self.templates.get(language)?.as_mapping()?.get(key)
    }

    /// Resolves a parameter's default reference to a literal for the given
    /// language.
    ///
    /// A reference that is not in the `DEFAULT` vocabulary at all is taken
    /// verbatim as a literal. A known symbolic name without a literal for
    /// the requested language is fatal.
    pub fn resolve_default(&self, reference: &str, language: &str) -> Result<String> {
        let unknown = || Error::UnknownDefault {
            type_name: self.name.clone(),
            name: reference.to_string(),
            language: language.to_string(),
        };
        match self.defaults.get(reference) {
            None => Ok(reference.to_string()),
            // A single literal shared by every language.
            Some(Value::String(literal)) => Ok(literal.clone()),
            Some(Value::Mapping(by_language)) => by_language
                .get(language)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(unknown),
            Some(_) => Err(unknown()),
        }
    }
}

/// All known types, owned here and referenced by name everywhere else.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
}

impl TypeRegistry {
    /// Builds the registry from the merged type document.
    pub fn from_document(document: &Mapping) -> Result<Self> {
        let mut types = Vec::with_capacity(document.len());
        for (key, value) in document {
            let name = key
                .as_str()
                .ok_or_else(|| Error::Other("type identifiers must be strings".to_string()))?;
            let properties = value.as_mapping().ok_or_else(|| {
                Error::Other(format!("definition of type {name} must be a mapping"))
            })?;
            types.push(TypeDescriptor::from_properties(name, properties)?);
        }
        Ok(TypeRegistry { types })
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Looks up a type, reporting the referencing function on failure.
    pub fn resolve(&self, name: &str, function: &str) -> Result<&TypeDescriptor> {
        self.get(name).ok_or_else(|| Error::UnknownType {
            function: function.to_string(),
            name: name.to_string(),
        })
    }
}

fn flag_list(type_name: &str, value: &Value) -> Result<BTreeSet<String>> {
    let parts: Vec<String> = match value {
        Value::String(text) => text
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::Other(format!("`FLAGS` of type {type_name} must contain strings"))
                })
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(Error::Other(format!(
                "`FLAGS` of type {type_name} must be a string or a sequence"
            )))
        }
    };
    Ok(parts.into_iter().map(|flag| flag.to_lowercase()).collect())
}
