//! Parameter grammar — `PARAMS` entries of a function definition
//!
//! An entry looks like `PRIMARY OUT VECTOR result` or `INTEGER n=10`:
//! optional modifiers (`PRIMARY`, one of `IN`/`OUT`/`INOUT`), then the type,
//! the identifier, and an optional `=default` reference. Defaults are stored
//! verbatim; they are resolved against the type's default vocabulary at
//! generation time.

use std::fmt;

use crate::error::{Error, Result};

/// Direction of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamMode {
    #[default]
    In,
    Out,
    InOut,
}

impl ParamMode {
    /// Parses a direction modifier token, if it is one.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "IN" => Some(ParamMode::In),
            "OUT" => Some(ParamMode::Out),
            "INOUT" => Some(ParamMode::InOut),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamMode::In => "IN",
            ParamMode::Out => "OUT",
            ParamMode::InOut => "INOUT",
        }
    }

    /// Whether a parameter with this mode is supplied by the caller.
    pub fn is_input(self) -> bool {
        matches!(self, ParamMode::In | ParamMode::InOut)
    }

    /// Whether a parameter with this mode carries a result back.
    pub fn is_output(self) -> bool {
        matches!(self, ParamMode::Out | ParamMode::InOut)
    }
}

impl fmt::Display for ParamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Specification of a single function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub type_name: String,
    pub mode: ParamMode,
    /// Marks the main result of the function; only meaningful for outputs.
    pub primary: bool,
    /// Default reference, verbatim from the definition. Either a literal or
    /// a symbolic name from the type's default vocabulary.
    pub default: Option<String>,
}

impl ParamSpec {
    pub fn is_input(&self) -> bool {
        self.mode.is_input()
    }

    pub fn is_output(&self) -> bool {
        self.mode.is_output()
    }
}

/// Parses the `PARAMS` string of one function into ordered parameter specs.
///
/// An empty or all-whitespace string is a function without parameters, not
/// an error.
pub fn parse_params(function: &str, text: &str) -> Result<Vec<ParamSpec>> {
    parse_param_entries(function, text.split(','))
}

/// Parses pre-split `PARAMS` entries; used when the definition file supplies
/// a sequence instead of a single comma-separated string.
pub fn parse_param_entries<'a, I>(function: &str, entries: I) -> Result<Vec<ParamSpec>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut params: Vec<ParamSpec> = Vec::new();
    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let spec = parse_entry(function, entry)?;
        if params.iter().any(|existing| existing.name == spec.name) {
            return Err(Error::DuplicateParameter {
                function: function.to_string(),
                name: spec.name,
            });
        }
        params.push(spec);
    }
    Ok(params)
}

fn parse_entry(function: &str, entry: &str) -> Result<ParamSpec> {
    let invalid = |detail: &str| Error::InvalidModifier {
        function: function.to_string(),
        text: entry.to_string(),
        detail: detail.to_string(),
    };

    let mut primary = false;
    let mut mode: Option<ParamMode> = None;
    let mut rest = entry;

    // Modifiers come first, in any order, each at most once.
    loop {
        let (token, tail) = match rest.split_once(char::is_whitespace) {
            Some((token, tail)) => (token, tail.trim_start()),
            None => (rest, ""),
        };
        if token == "PRIMARY" {
            if primary {
                return Err(invalid("`PRIMARY` given twice"));
            }
            primary = true;
            rest = tail;
        } else if let Some(parsed) = ParamMode::from_token(token) {
            if mode.is_some() {
                return Err(invalid("more than one direction modifier"));
            }
            mode = Some(parsed);
            rest = tail;
        } else {
            break;
        }
    }

    let mode = mode.unwrap_or_default();

    if primary && !mode.is_output() {
        return Err(invalid("`PRIMARY` is only valid for OUT or INOUT parameters"));
    }

    let (type_name, rest) = rest
        .split_once(char::is_whitespace)
        .map(|(t, r)| (t, r.trim_start()))
        .ok_or_else(|| invalid("expected `TYPE identifier`"))?;

    let (name, default) = match rest.split_once('=') {
        Some((name, default)) => (name.trim(), Some(default.trim().to_string())),
        None => (rest, None),
    };

    if name.is_empty() {
        return Err(invalid("missing parameter identifier"));
    }
    if name.contains(char::is_whitespace) {
        return Err(invalid("unexpected token after parameter identifier"));
    }

    if default.is_some() && !mode.is_input() {
        return Err(invalid("default values are only valid for IN or INOUT parameters"));
    }

    Ok(ParamSpec {
        name: name.to_string(),
        type_name: type_name.to_string(),
        mode,
        primary,
        default,
    })
}
