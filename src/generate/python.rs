//! Python backend — typed ctypes wrappers
//!
//! For each function this emits a typed Python wrapper that converts its
//! arguments into ctypes values (`INCONV` templates), constructs buffers for
//! the output parameters, calls the shared library through `_lib`, converts
//! the results back (`OUTCONV` templates), and returns them. Annotations
//! come from the `PY_TYPE` vocabulary of each type, falling back to `Any`.
//!
//! The generated module assumes the enclosing package provides `_lib` (the
//! loaded shared library), the error checkers referenced
//! from type templates, and the `begin_progress`/`end_progress` helpers for
//! progress-flagged functions.

use super::{CodeGenerator, Surface};
use crate::error::{Error, Result};
use crate::model::FunctionDescriptor;
use crate::params::ParamMode;
use crate::registry::{TypeDescriptor, TypeRegistry};
use crate::subst::{substitute, Substitution};

const LANGUAGE: &str = "Python";
const IND: &str = "    ";

/// Return types with no value to hand back to the caller.
const UNRETURNED: &[&str] = &["ERROR", "VOID"];

/// Identifiers that must not be used verbatim as Python parameter names.
const KEYWORDS: &[&str] = &[
    "and", "class", "def", "del", "elif", "else", "for", "from", "global", "if", "import", "in",
    "is", "lambda", "not", "or", "pass", "raise", "return", "while", "with", "yield",
];

pub struct PythonWrapperGenerator;

impl CodeGenerator for PythonWrapperGenerator {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn generate_function(
        &self,
        function: &FunctionDescriptor,
        types: &TypeRegistry,
    ) -> Result<String> {
        if function.has_primary_output() {
            let mut out = self.wrapper(function, types, Surface::Primary)?;
            out.push('\n');
            out.push_str(&self.wrapper(function, types, Surface::Full)?);
            Ok(out)
        } else {
            self.wrapper(function, types, Surface::Full)
        }
    }
}

impl PythonWrapperGenerator {
    fn wrapper(
        &self,
        function: &FunctionDescriptor,
        types: &TypeRegistry,
        surface: Surface,
    ) -> Result<String> {
        let base = function.name_for(LANGUAGE);
        let mut surface_name = if function.is_internal() && !base.starts_with('_') {
            format!("_{base}")
        } else {
            base.to_string()
        };
        if function.has_primary_output() && surface == Surface::Full {
            surface_name.push_str("_all");
        }

        // Header arguments: defaults may not be followed by bare parameters,
        // Python rejects such a signature.
        let mut head: Vec<String> = Vec::new();
        let mut seen_default: Option<String> = None;
        for param in function.inputs() {
            let typ = types.resolve(&param.type_name, &function.name)?;
            let mut arg = format!("{}: {}", mangle(&param.name), annotation(typ));
            if let Some(reference) = &param.default {
                let literal = typ.resolve_default(reference, LANGUAGE)?;
                arg.push_str(&format!(" = {literal}"));
                seen_default = Some(param.name.clone());
            } else if let Some(defaulted) = &seen_default {
                return Err(Error::Other(format!(
                    "parameter {} of function {} has no default but follows the defaulted \
                     parameter {}",
                    param.name, function.name, defaulted
                )));
            }
            head.push(arg);
        }

        // Values handed back to the caller: the C return value when it
        // carries one, then the output parameters of this surface.
        let mut returns: Vec<(String, String)> = Vec::new();
        if !UNRETURNED.contains(&function.return_type.as_str()) {
            let typ = types.resolve(&function.return_type, &function.name)?;
            returns.push(("result".to_string(), annotation(typ)));
        }
        for param in function.outputs().filter(|param| surface.includes(param)) {
            let typ = types.resolve(&param.type_name, &function.name)?;
            returns.push((mangle(&param.name), annotation(typ)));
        }
        let return_annotation = match returns.len() {
            0 => "None".to_string(),
            1 => returns[0].1.clone(),
            _ => format!(
                "Tuple[{}]",
                returns.iter().map(|(_, a)| a.as_str()).collect::<Vec<_>>().join(", ")
            ),
        };

        let mut out = String::new();
        out.push_str(&format!(
            "def {surface_name}({}) -> {return_annotation}:\n",
            head.join(", ")
        ));

        if function.has_flag("deprecated") {
            out.push_str(&format!(
                "{IND}warnings.warn(\"{surface_name} is deprecated\", DeprecationWarning)\n"
            ));
        }

        // Input conversions and output buffer construction, in declared
        // parameter order. Outputs excluded from this surface still need a
        // buffer, the C function writes into all of them.
        for param in &function.params {
            let typ = types.resolve(&param.type_name, &function.name)?;
            let line = match typ.input_conversion(LANGUAGE, param.mode) {
                Some("") => continue,
                Some(template) => self.apply(template, function, param, typ)?,
                None if param.is_input() => {
                    self.apply("%C% = %I%", function, param, typ)?
                }
                None => {
                    return Err(Error::Other(format!(
                        "cannot construct an instance of type {} for output parameter {} of \
                         function {}: the type has no Python OUT conversion",
                        typ.name, param.name, function.name
                    )))
                }
            };
            out.push_str(&format!("{IND}{line}\n"));
        }

        if function.has_flag("progress") {
            out.push_str(&format!("{IND}begin_progress()\n"));
        }

        // Library call: one argument per parameter, via the CALL template
        // when the type has one. An empty CALL omits the argument.
        let mut parts: Vec<String> = Vec::new();
        for param in &function.params {
            let typ = types.resolve(&param.type_name, &function.name)?;
            let template = typ.template(LANGUAGE, "CALL").unwrap_or("%C%");
            if template.is_empty() {
                continue;
            }
            parts.push(self.apply(template, function, param, typ)?);
        }
        if UNRETURNED.contains(&function.return_type.as_str())
            && types
                .resolve(&function.return_type, &function.name)?
                .template_for_mode(LANGUAGE, "OUTCONV", ParamMode::Out)
                .is_none()
        {
            out.push_str(&format!("{IND}_lib.{}({})\n", function.name, parts.join(", ")));
        } else {
            out.push_str(&format!(
                "{IND}c__result = _lib.{}({})\n",
                function.name,
                parts.join(", ")
            ));
        }

        if function.has_flag("progress") {
            out.push_str(&format!("{IND}end_progress()\n"));
        }

        // Return-value conversion: for ERROR-like types this is the status
        // check, for value-carrying types it produces `result`.
        let return_type = types.resolve(&function.return_type, &function.name)?;
        let return_conv = return_type
            .template_for_mode(LANGUAGE, "OUTCONV", ParamMode::Out)
            .filter(|template| !template.is_empty());
        if let Some(template) = return_conv {
            let ctx = Substitution {
                function: &function.name,
                param: "result",
                c_name: "c__result",
                type_name: &return_type.name,
                deps: &[],
            };
            out.push_str(&format!("{IND}{}\n", substitute(template, &ctx)?));
        } else if !UNRETURNED.contains(&function.return_type.as_str()) {
            out.push_str(&format!("{IND}result = c__result\n"));
        }

        // Output conversions for the parameters this surface returns.
        for param in function.outputs().filter(|param| surface.includes(param)) {
            let typ = types.resolve(&param.type_name, &function.name)?;
            let template = typ
                .template_for_mode(LANGUAGE, "OUTCONV", param.mode)
                .unwrap_or("%I% = %C%.value");
            if template.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "{IND}{}\n",
                self.apply(template, function, param, typ)?
            ));
        }

        match returns.len() {
            0 => {}
            1 => out.push_str(&format!("{IND}return {}\n", returns[0].0)),
            _ => out.push_str(&format!(
                "{IND}return ({})\n",
                returns.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(", ")
            )),
        }
        Ok(out)
    }

    fn apply(
        &self,
        template: &str,
        function: &FunctionDescriptor,
        param: &crate::params::ParamSpec,
        typ: &TypeDescriptor,
    ) -> Result<String> {
        let ctx = Substitution {
            function: &function.name,
            param: &mangle(&param.name),
            c_name: &format!("c_{}", param.name),
            type_name: &typ.name,
            deps: function.deps.get(&param.name),
        };
        substitute(template, &ctx)
    }
}

fn annotation(typ: &TypeDescriptor) -> String {
    typ.template(LANGUAGE, "PY_TYPE").unwrap_or("Any").to_string()
}

/// Keyword parameter names get a trailing underscore, the ctypes-side
/// `c_<name>` spelling stays untouched.
fn mangle(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}
