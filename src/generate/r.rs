//! R backend — high-level wrapper functions around `.Call` glue
//!
//! For each function this emits an R wrapper that checks and converts its
//! input arguments (`INCONV` templates), invokes the native extension entry
//! point, converts the outputs (`OUTCONV` templates), and applies the
//! backend-specific extras (`GATTR`, `GATTR-PARAM`, `CLASS`, `PP`). The
//! generated code assumes the enclosing package provides the `C_<name>`
//! native symbols and, for progress-flagged functions, the
//! `make_progress_bar`/`close_progress_bar` helpers.
//!
//! Native contract: a `C_<name>` symbol returns its single declared output
//! (or its converted return value) directly, and a named list keyed by
//! parameter name when the function declares several outputs. The shape
//! depends on the declared outputs only, so the primary call surface
//! extracts its value from the same list the full surface returns.
//!
//! Underscores in parameter identifiers are rendered as dots, the usual R
//! spelling; dependency placeholders substitute the declared identifiers
//! unchanged.

use super::{CodeGenerator, Surface};
use crate::error::{Error, Result};
use crate::model::FunctionDescriptor;
use crate::params::{ParamMode, ParamSpec};
use crate::registry::{TypeDescriptor, TypeRegistry};
use crate::subst::{substitute, Substitution};

const LANGUAGE: &str = "R";

pub struct RWrapperGenerator;

impl CodeGenerator for RWrapperGenerator {
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

impl RWrapperGenerator {
    fn wrapper(
        &self,
        function: &FunctionDescriptor,
        types: &TypeRegistry,
        surface: Surface,
    ) -> Result<String> {
        let name = function.name_for(LANGUAGE);
        let surface_name = if function.has_primary_output() && surface == Surface::Full {
            format!("{name}.all")
        } else {
            name.to_string()
        };

        let mut out = String::new();

        if !function.is_internal() {
            out.push_str("#' @export\n");
        }

        // Header: IN and INOUT arguments, with defaults resolved through
        // the type's R vocabulary.
        let mut head: Vec<String> = Vec::new();
        for param in function.inputs() {
            let typ = types.resolve(&param.type_name, &function.name)?;
            let template = typ.template(LANGUAGE, "HEADER").unwrap_or("%I%");
            // An explicitly empty HEADER removes the argument entirely.
            if template.is_empty() {
                continue;
            }
            let mut arg = self.apply(template, function, param, typ)?;
            if let Some(reference) = &param.default {
                let literal = typ.resolve_default(reference, LANGUAGE)?;
                arg.push('=');
                arg.push_str(&literal);
            }
            head.push(arg);
        }
        out.push_str(&format!("{surface_name} <- function({}) {{\n", head.join(", ")));

        if function.has_flag("deprecated") {
            out.push_str(&format!("  .Deprecated(\"{surface_name}\")\n"));
        }

        // Argument checks and input conversions.
        let mut checks: Vec<String> = Vec::new();
        for param in function.inputs() {
            let typ = types.resolve(&param.type_name, &function.name)?;
            if let Some(template) = typ.input_conversion(LANGUAGE, param.mode) {
                if !template.is_empty() {
                    checks.push(format!("  {}", self.apply(template, function, param, typ)?));
                }
            }
        }
        if !checks.is_empty() {
            out.push_str("  # Argument checks\n");
            for check in checks {
                out.push_str(&check);
                out.push('\n');
            }
        }

        if function.has_flag("progress") {
            out.push_str("  # Progress reporting\n");
            out.push_str("  pb <- make_progress_bar()\n");
            out.push_str("  on.exit(close_progress_bar(pb), add = TRUE)\n");
        }

        // Native call: one part per input argument, using the CALL template
        // when the type has one. An empty CALL omits the argument.
        let mut parts: Vec<String> = Vec::new();
        for param in function.inputs() {
            let typ = types.resolve(&param.type_name, &function.name)?;
            let template = typ.template(LANGUAGE, "CALL").unwrap_or("%I%");
            if template.is_empty() {
                continue;
            }
            parts.push(self.apply(template, function, param, typ)?);
        }
        out.push_str("  # Function call\n");
        if parts.is_empty() {
            out.push_str(&format!("  res <- .Call(C_{})\n", function.name));
        } else {
            out.push_str(&format!(
                "  res <- .Call(C_{}, {})\n",
                function.name,
                parts.join(", ")
            ));
        }

        // Output conversions. The native call yields its single declared
        // output in `res` itself and a named list when there are several;
        // the list shape does not depend on the call surface.
        let call_outputs: Vec<&ParamSpec> = function.outputs().collect();
        let returned: Vec<&ParamSpec> = function
            .outputs()
            .filter(|param| surface.includes(param))
            .collect();
        for param in &function.params {
            if !param.is_output() || !surface.includes(param) {
                continue;
            }
            let typ = types.resolve(&param.type_name, &function.name)?;
            if let Some(template) = typ.template_for_mode(LANGUAGE, "OUTCONV", param.mode) {
                if template.is_empty() {
                    continue;
                }
                let target = if call_outputs.len() <= 1 {
                    "res".to_string()
                } else {
                    format!("res${}", dotted(&param.name))
                };
                let ctx = Substitution {
                    function: &function.name,
                    param: &target,
                    c_name: "",
                    type_name: &typ.name,
                    deps: function.deps.get(&param.name),
                };
                out.push_str(&format!("  {}\n", substitute(template, &ctx)?));
            }
        }
        if returned.is_empty() {
            // No output arguments: the native return value is the result.
            let return_type = types.resolve(&function.return_type, &function.name)?;
            if let Some(template) =
                return_type.template_for_mode(LANGUAGE, "OUTCONV", ParamMode::Out)
            {
                if !template.is_empty() {
                    let ctx = Substitution {
                        function: &function.name,
                        param: "res",
                        c_name: "",
                        type_name: &return_type.name,
                        deps: &[],
                    };
                    out.push_str(&format!("  {}\n", substitute(template, &ctx)?));
                }
            }
        } else if returned.len() < call_outputs.len() {
            // Narrow surface: take the returned outputs out of the list.
            if let [only] = returned.as_slice() {
                out.push_str(&format!("  res <- res${}\n", dotted(&only.name)));
            } else {
                let names: Vec<String> = returned
                    .iter()
                    .map(|param| format!("\"{}\"", dotted(&param.name)))
                    .collect();
                out.push_str(&format!("  res <- res[c({})]\n", names.join(", ")));
            }
        }

        self.apply_extras(function, &mut out)?;

        out.push_str("  res\n}\n");
        Ok(out)
    }

    /// Backend-specific extra properties, applied to `res` before it is
    /// returned.
    fn apply_extras(&self, function: &FunctionDescriptor, out: &mut String) -> Result<()> {
        if let Some(text) = function.extra_str("GATTR") {
            for entry in text.split(',') {
                let (name, value) = entry.split_once(" IS ").ok_or_else(|| {
                    Error::Other(format!(
                        "malformed GATTR entry `{}` in function {}: expected `<name> IS <value>`",
                        entry.trim(),
                        function.name
                    ))
                })?;
                let value = value.trim().replace('\'', "\\'");
                out.push_str(&format!(
                    "  attr(res, '{}') <- '{}'\n",
                    name.trim(),
                    value
                ));
            }
        }
        if let Some(text) = function.extra_str("GATTR-PARAM") {
            for entry in text.split(',') {
                let param = dotted(entry.trim());
                out.push_str(&format!("  attr(res, '{param}') <- {param}\n"));
            }
        }
        if let Some(class) = function.extra_str("CLASS") {
            out.push_str(&format!("  class(res) <- \"{class}\"\n"));
        }
        if let Some(postprocessor) = function.extra_str("PP") {
            out.push_str(&format!("  res <- {postprocessor}(res)\n"));
        }
        Ok(())
    }

    fn apply(
        &self,
        template: &str,
        function: &FunctionDescriptor,
        param: &ParamSpec,
        typ: &TypeDescriptor,
    ) -> Result<String> {
        let ctx = Substitution {
            function: &function.name,
            param: &dotted(&param.name),
            c_name: "",
            type_name: &typ.name,
            deps: function.deps.get(&param.name),
        };
        substitute(template, &ctx)
    }
}

fn dotted(name: &str) -> String {
    name.replace('_', ".")
}
