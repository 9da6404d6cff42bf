//! Template substitution
//!
//! Two substitution languages live here. Type templates use percent
//! placeholders: `%I%` for the parameter identifier, `%C%` for its C-side
//! identifier, and `%I1%`/`%C1%` (1-based) for the identifiers of the
//! parameter's declared dependencies. Placeholders substitute identifiers,
//! never values. A placeholder index past the end of the dependency list is
//! a definition/template mismatch and fatal.
//!
//! Output templates use `%%name%%` markers. [`render_into`] replaces each
//! marker whose name matches a generated fragment and leaves every other
//! byte of the input untouched; the marker syntax is a stable external
//! contract.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Context for one type-template substitution.
#[derive(Debug, Clone, Copy)]
pub struct Substitution<'a> {
    /// Function being generated, for error reporting.
    pub function: &'a str,
    /// Identifier substituted for `%I%`. Backends may pass a language-mangled
    /// spelling of the parameter name here.
    pub param: &'a str,
    /// Identifier substituted for `%C%`.
    pub c_name: &'a str,
    /// Abstract type owning the template, for error reporting.
    pub type_name: &'a str,
    /// Resolved dependency identifiers of the parameter, in declaration
    /// order; `%In%` substitutes the n-th entry, `%Cn%` its `c_`-prefixed
    /// spelling.
    pub deps: &'a [String],
}

fn index_placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%[IC]([0-9]+)%").expect("valid regex"))
}

/// Applies a type template to one parameter.
pub fn substitute(template: &str, ctx: &Substitution<'_>) -> Result<String> {
    let mut out = template.replace("%I%", ctx.param).replace("%C%", ctx.c_name);
    for (i, dep) in ctx.deps.iter().enumerate() {
        out = out
            .replace(&format!("%I{}%", i + 1), dep)
            .replace(&format!("%C{}%", i + 1), &format!("c_{dep}"));
    }
    if let Some(capture) = index_placeholder().captures(&out) {
        let index = capture[1].parse::<usize>().unwrap_or(usize::MAX);
        return Err(Error::DependencyIndex {
            function: ctx.function.to_string(),
            param: ctx.param.to_string(),
            type_name: ctx.type_name.to_string(),
            index,
            available: ctx.deps.len(),
        });
    }
    Ok(out)
}

/// Splices generated fragments into a pass-through template.
///
/// Pure substitution: each `%%name%%` marker with a matching fragment is
/// replaced by the fragment text; everything else, including markers with
/// unknown names, is preserved byte-for-byte.
pub fn render_into(template: &str, fragments: &[(String, String)]) -> String {
    let mut out = template.to_string();
    for (name, text) in fragments {
        out = out.replace(&format!("%%{name}%%"), text);
    }
    out
}
