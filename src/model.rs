//! Definition model — typed view of the merged function document
//!
//! One [`FunctionDescriptor`] per function in the merged document, in
//! document order. Construction parses the `PARAMS` and `DEPS` grammars and
//! validates that every dependency entry names a parameter of the same
//! function. Everything outside the recognized property set is kept as an
//! opaque, ordered bag for backend-specific use (`GATTR`, `CLASS`, ...).

use std::collections::BTreeSet;

use serde_norway::{Mapping, Value};

use crate::deps::{parse_deps, DependencyMap};
use crate::error::{Error, Result};
use crate::params::{parse_param_entries, parse_params, ParamSpec};

/// Properties consumed by the model itself; everything else is opaque.
const RECOGNIZED_KEYS: &[&str] = &["PARAMS", "DEPS", "RETURN", "IGNORE", "NAME", "FLAGS", "INTERNAL"];

/// Return type used when a definition does not specify one.
pub const DEFAULT_RETURN_TYPE: &str = "ERROR";

/// Per-language name override of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NameOverride {
    /// One name for every target language.
    All(String),
    /// Language tag to name, in declaration order.
    PerLanguage(Vec<(String, String)>),
}

/// Describes a single function for which glue code can be generated.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    /// Identifier of the underlying C function.
    pub name: String,
    /// Parameters in calling-convention order.
    pub params: Vec<ParamSpec>,
    /// Parameter dependency lists, validated against `params`.
    pub deps: DependencyMap,
    /// Abstract return type; `ERROR` unless the definition says otherwise.
    pub return_type: String,
    /// Lowercased symbolic tags (`progress`, `deprecated`, `internal`, ...).
    pub flags: BTreeSet<String>,
    /// Language tags whose backends skip this function.
    pub ignored_by: BTreeSet<String>,
    name_override: Option<NameOverride>,
    /// Unrecognized properties, passed through for backends.
    pub extra: Mapping,
}

impl FunctionDescriptor {
    /// Builds a descriptor from the property mapping of one function in the
    /// merged document.
    pub fn from_properties(name: &str, properties: &Mapping) -> Result<Self> {
        let params = match properties.get("PARAMS") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(text)) => parse_params(name, text)?,
            Some(Value::Sequence(items)) => {
                let entries = items
                    .iter()
                    .map(|item| {
                        item.as_str().ok_or_else(|| {
                            property_error(name, "PARAMS", "must contain strings")
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                parse_param_entries(name, entries)?
            }
            Some(_) => return Err(property_error(name, "PARAMS", "must be a string or a sequence")),
        };

        let deps = match properties.get("DEPS") {
            None | Some(Value::Null) => DependencyMap::default(),
            Some(Value::String(text)) => parse_deps(name, text)?,
            Some(_) => return Err(property_error(name, "DEPS", "must be a string")),
        };

        let return_type = match properties.get("RETURN") {
            None | Some(Value::Null) => DEFAULT_RETURN_TYPE.to_string(),
            Some(Value::String(text)) => text.trim().to_string(),
            Some(_) => return Err(property_error(name, "RETURN", "must be a string")),
        };

        let ignored_by = match properties.get("IGNORE") {
            None => BTreeSet::new(),
            Some(value) => string_list(name, "IGNORE", value)?.into_iter().collect(),
        };

        let mut flags: BTreeSet<String> = match properties.get("FLAGS") {
            None => BTreeSet::new(),
            Some(value) => string_list(name, "FLAGS", value)?
                .into_iter()
                .map(|flag| flag.to_lowercase())
                .collect(),
        };
        match properties.get("INTERNAL").map(|v| as_boolean(name, v)).transpose()? {
            Some(true) => {
                flags.insert("internal".to_string());
            }
            Some(false) => {
                flags.remove("internal");
            }
            None => {}
        }

        let name_override = match properties.get("NAME") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(NameOverride::All(text.clone())),
            Some(Value::Mapping(by_language)) => {
                let mut overrides = Vec::new();
                for (language, value) in by_language {
                    let (Some(language), Some(value)) = (language.as_str(), value.as_str())
                    else {
                        return Err(property_error(
                            name,
                            "NAME",
                            "language tags and names must be strings",
                        ));
                    };
                    overrides.push((language.to_string(), value.to_string()));
                }
                Some(NameOverride::PerLanguage(overrides))
            }
            Some(_) => {
                return Err(property_error(name, "NAME", "must be a string or a mapping"))
            }
        };

        let mut extra = Mapping::new();
        for (key, value) in properties {
            let recognized = key
                .as_str()
                .is_some_and(|key| RECOGNIZED_KEYS.contains(&key));
            if !recognized {
                extra.insert(key.clone(), value.clone());
            }
        }

        let descriptor = FunctionDescriptor {
            name: name.to_string(),
            params,
            deps,
            return_type,
            flags,
            ignored_by,
            name_override,
            extra,
        };
        descriptor.validate_dependencies()?;
        Ok(descriptor)
    }

    /// Every `DEPS` identifier, on either side of `ON`, must name a
    /// parameter of this function. Runs after the whole descriptor is
    /// assembled so forward references are legal.
    fn validate_dependencies(&self) -> Result<()> {
        let unknown = |name: &str| Error::UnknownDependency {
            function: self.name.clone(),
            name: name.to_string(),
        };
        for (param, deps) in self.deps.iter() {
            if self.param(param).is_none() {
                return Err(unknown(param));
            }
            for dep in deps {
                if self.param(dep).is_none() {
                    return Err(unknown(dep));
                }
            }
        }
        Ok(())
    }

    /// Checks a flag in a case-insensitive manner.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag.to_lowercase())
    }

    /// Whether the function should stay out of the public namespace of the
    /// generated higher-level interface.
    pub fn is_internal(&self) -> bool {
        self.has_flag("internal")
    }

    pub fn is_ignored_by(&self, language: &str) -> bool {
        self.ignored_by.contains(language)
    }

    /// Externally visible name for the given language: the per-language
    /// override when present, the identifier otherwise.
    pub fn name_for(&self, language: &str) -> &str {
        match &self.name_override {
            Some(NameOverride::All(name)) => name,
            Some(NameOverride::PerLanguage(overrides)) => overrides
                .iter()
                .find(|(tag, _)| tag == language)
                .map(|(_, name)| name.as_str())
                .unwrap_or(&self.name),
            None => &self.name,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|param| param.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|param| param.is_output())
    }

    pub fn primary_outputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.outputs().filter(|param| param.primary)
    }

    pub fn has_primary_output(&self) -> bool {
        self.primary_outputs().next().is_some()
    }

    /// String-valued extra property, for backend-specific keys.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

fn property_error(function: &str, key: &str, detail: &str) -> Error {
    Error::Other(format!("`{key}` of function {function} {detail}"))
}

/// `IGNORE` and `FLAGS` accept either a sequence or a comma-separated string.
fn string_list(function: &str, key: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(text) => Ok(text
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| property_error(function, key, "must contain strings"))
            })
            .collect(),
        _ => Err(property_error(function, key, "must be a string or a sequence")),
    }
}

fn as_boolean(function: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => Ok(matches!(s.to_lowercase().as_str(), "true" | "yes" | "y")),
        _ => Err(property_error(function, "INTERNAL", "must be a boolean")),
    }
}

/// Builds the full model from the merged function document, preserving
/// document order. The merged document is not retained afterwards; the
/// descriptors are the source of truth from here on.
pub fn build_model(merged: &Mapping) -> Result<Vec<FunctionDescriptor>> {
    let mut model = Vec::with_capacity(merged.len());
    for (key, value) in merged {
        let name = key
            .as_str()
            .ok_or_else(|| Error::Other("function identifiers must be strings".to_string()))?;
        let properties = value.as_mapping().ok_or_else(|| {
            Error::Other(format!("definition of function {name} must be a mapping"))
        })?;
        model.push(FunctionDescriptor::from_properties(name, properties)?);
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMode;
    use pretty_assertions::assert_eq;

    fn document(yaml: &str) -> Mapping {
        serde_norway::from_str(yaml).unwrap()
    }

    fn single(yaml: &str) -> FunctionDescriptor {
        let model = build_model(&document(yaml)).unwrap();
        assert_eq!(model.len(), 1);
        model.into_iter().next().unwrap()
    }

    #[test]
    fn model_preserves_document_order() {
        let model = build_model(&document(
            "lib_b:\n  RETURN: INTEGER\nlib_a:\n  RETURN: INTEGER\n",
        ))
        .unwrap();
        let names: Vec<&str> = model.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["lib_b", "lib_a"]);
    }

    #[test]
    fn return_type_defaults_to_error_sentinel() {
        let func = single("lib_f:\n  PARAMS: GRAPH graph\n");
        assert_eq!(func.return_type, DEFAULT_RETURN_TYPE);
    }

    #[test]
    fn flags_and_ignore_accept_strings_and_sequences() {
        let func = single(
            "lib_f:\n  FLAGS: Progress, DEPRECATED\n  IGNORE: [R, Python]\n",
        );
        assert!(func.has_flag("PROGRESS"));
        assert!(func.has_flag("deprecated"));
        assert!(func.is_ignored_by("R"));
        assert!(func.is_ignored_by("Python"));
        assert!(!func.is_ignored_by("Java"));
    }

    #[test]
    fn internal_key_toggles_the_internal_flag() {
        let func = single("lib_f:\n  INTERNAL: yes\n");
        assert!(func.is_internal());
        let func = single("lib_f:\n  FLAGS: internal\n  INTERNAL: false\n");
        assert!(!func.is_internal());
    }

    #[test]
    fn name_override_applies_per_language_or_to_all() {
        let func = single("lib_f:\n  NAME:\n    R: lib.f\n");
        assert_eq!(func.name_for("R"), "lib.f");
        assert_eq!(func.name_for("Python"), "lib_f");

        let func = single("lib_f:\n  NAME: f\n");
        assert_eq!(func.name_for("R"), "f");
        assert_eq!(func.name_for("Python"), "f");
    }

    #[test]
    fn forward_dependency_references_are_legal() {
        let func = single(
            "lib_f:\n  PARAMS: OUT VECTOR res, GRAPH graph\n  DEPS: res ON graph\n",
        );
        assert_eq!(func.deps.get("res"), ["graph"]);
    }

    #[test]
    fn dependency_on_unknown_parameter_is_fatal() {
        let err = build_model(&document(
            "lib_f:\n  PARAMS: GRAPH graph\n  DEPS: res ON graph\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDependency { ref name, .. } if name == "res"
        ));

        let err = build_model(&document(
            "lib_f:\n  PARAMS: OUT VECTOR res, GRAPH graph\n  DEPS: res ON weights\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDependency { ref name, .. } if name == "weights"
        ));
    }

    #[test]
    fn unrecognized_properties_land_in_the_extra_bag() {
        let func = single(
            "lib_f:\n  PARAMS: GRAPH graph\n  GATTR: name IS fancy\n  CLASS: communities\n",
        );
        assert_eq!(func.extra_str("GATTR"), Some("name IS fancy"));
        assert_eq!(func.extra_str("CLASS"), Some("communities"));
        assert_eq!(func.extra_str("PARAMS"), None);
    }

    #[test]
    fn params_sequence_form() {
        let func = single("lib_f:\n  PARAMS:\n    - GRAPH graph\n    - OUT VECTOR res\n");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].mode, ParamMode::Out);
    }
}
