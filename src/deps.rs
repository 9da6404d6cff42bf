//! Dependency grammar — `DEPS` entries of a function definition
//!
//! An entry looks like `res ON graph vids`: the parameter before `ON`
//! depends on the whitespace-separated parameters after it. The order of
//! the dependency list matters; type templates address the Nth dependency
//! with a 1-based positional placeholder (`%I1%`, `%I2%`, ...).
//!
//! Whether the named parameters actually exist on the function is checked
//! after the whole function is assembled, not here, because a dependency
//! entry may legally reference a parameter declared later in `PARAMS`.

use crate::error::{Error, Result};

/// Per-parameter dependency lists of one function, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: Vec<(String, Vec<String>)>,
}

impl DependencyMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dependency identifiers of the given parameter; empty when the
    /// parameter has no `DEPS` entry.
    pub fn get(&self, param: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, deps)| deps.as_slice())
            .unwrap_or(&[])
    }

    /// 1-based positional lookup into a parameter's dependency list.
    pub fn dependency_at(&self, param: &str, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.get(param).get(i))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.as_slice()))
    }
}

/// Parses the `DEPS` string of one function.
pub fn parse_deps(function: &str, text: &str) -> Result<DependencyMap> {
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    for item in text.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let mut tokens = item.split_whitespace();
        let param = tokens.next();
        let keyword = tokens.next();
        let deps: Vec<String> = tokens.map(str::to_string).collect();
        let param = match (param, keyword) {
            (Some(param), Some("ON")) if !deps.is_empty() => param.to_string(),
            _ => {
                return Err(Error::Other(format!(
                    "malformed DEPS entry `{item}` in function {function}: \
                     expected `<param> ON <dep> [<dep> ...]`"
                )))
            }
        };
        // A later entry for the same parameter replaces the earlier one.
        if let Some(existing) = entries.iter_mut().find(|(name, _)| *name == param) {
            existing.1 = deps;
        } else {
            entries.push((param, deps));
        }
    }
    Ok(DependencyMap { entries })
}
