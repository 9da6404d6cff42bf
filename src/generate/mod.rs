//! Code generation — backends and the generation pipeline
//!
//! A backend is a [`CodeGenerator`] registered under a language tag. The
//! pipeline merges the layered definition documents, builds the typed model,
//! resolves every referenced type up front, and only then lets the backend
//! emit text, so a fatal definition error never produces partial output.
//!
//! Backends share a set of behavioral rules: functions whose `IGNORE` list
//! contains the backend's language tag are skipped silently, generated
//! names come from the per-language `NAME` override when present, functions
//! are emitted in merged-document order with parameters in declared order,
//! and unknown flags are ignored. When a function marks one of its outputs
//! `PRIMARY`, every backend emits two call surfaces: the primary surface
//! under the resolved name, returning only primary outputs, and a full
//! surface under an `all`-suffixed name returning every output.

pub mod python;
pub mod r;

use serde_norway::Mapping;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::merge::merge_documents;
use crate::model::{build_model, FunctionDescriptor};
use crate::params::ParamSpec;
use crate::registry::TypeRegistry;
use crate::subst::render_into;

/// Language tags with a registered backend.
pub const LANGUAGES: &[&str] = &["R", "Python"];

/// Interface implemented by every language backend.
pub trait CodeGenerator {
    /// Language tag this backend is registered under; also the tag matched
    /// against `IGNORE` lists and used for `NAME` overrides and default
    /// vocabularies.
    fn language(&self) -> &'static str;

    /// Line-comment prefix of the target language, for the provenance
    /// header.
    fn comment_prefix(&self) -> &'static str {
        "#"
    }

    /// Emits the glue code of a single function.
    fn generate_function(
        &self,
        function: &FunctionDescriptor,
        types: &TypeRegistry,
    ) -> Result<String>;

    /// Emits the whole output: every non-ignored function, in model order.
    fn generate(&self, model: &[FunctionDescriptor], types: &TypeRegistry) -> Result<String> {
        let mut out = String::new();
        for function in model {
            if function.is_ignored_by(self.language()) {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.generate_function(function, types)?);
        }
        Ok(out)
    }
}

/// Explicit language-tag registry; a miss is fatal before any parsing work.
pub fn backend_for(language: &str) -> Result<Box<dyn CodeGenerator>> {
    match language {
        "R" => Ok(Box::new(r::RWrapperGenerator)),
        "Python" => Ok(Box::new(python::PythonWrapperGenerator)),
        _ => Err(Error::UnsupportedLanguage(language.to_string())),
    }
}

/// One of the two call surfaces generated for a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Exposes only the outputs marked `PRIMARY`.
    Primary,
    /// Exposes every output.
    Full,
}

impl Surface {
    /// Whether an output parameter is part of this call surface.
    pub fn includes(self, param: &ParamSpec) -> bool {
        match self {
            Surface::Full => true,
            Surface::Primary => param.primary,
        }
    }
}

/// Everything one generation run needs, threaded explicitly so several runs
/// (e.g. looping over languages) can share a process without ambient state.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Target language tag; must have a registered backend.
    pub language: String,
    /// Parsed function-definition documents, in override order.
    pub function_docs: Vec<Mapping>,
    /// Parsed type-definition documents, in override order.
    pub type_docs: Vec<Mapping>,
    /// Optional pass-through template; generated code replaces its
    /// `%%functions%%` marker.
    pub template: Option<String>,
}

/// Runs the full pipeline: merge, model, resolve, emit.
///
/// The output is a pure function of the request; running twice on identical
/// inputs produces byte-identical text.
pub fn run(request: &GenerateRequest) -> Result<String> {
    let backend = backend_for(&request.language)?;

    let functions_doc = merge_documents(request.function_docs.iter().cloned());
    let types_doc = merge_documents(request.type_docs.iter().cloned());

    let model = build_model(&functions_doc)?;
    let types = TypeRegistry::from_document(&types_doc)?;
    validate_types(&model, &types, backend.language())?;

    let digest = source_digest(&functions_doc, &types_doc)?;
    let mut generated = provenance_header(backend.comment_prefix(), &digest);
    generated.push('\n');
    generated.push_str(&backend.generate(&model, &types)?);

    Ok(match &request.template {
        Some(template) => {
            render_into(template, &[("functions".to_string(), generated)])
        }
        None => generated,
    })
}

/// Every parameter and return type of every non-ignored function must
/// resolve before a single line is emitted.
fn validate_types(
    model: &[FunctionDescriptor],
    types: &TypeRegistry,
    language: &str,
) -> Result<()> {
    for function in model {
        if function.is_ignored_by(language) {
            continue;
        }
        for param in &function.params {
            types.resolve(&param.type_name, &function.name)?;
        }
        types.resolve(&function.return_type, &function.name)?;
    }
    Ok(())
}

/// Digest of the merged definition documents, for the provenance header.
/// Hashing the inputs instead of embedding a timestamp keeps repeated runs
/// byte-identical.
fn source_digest(functions_doc: &Mapping, types_doc: &Mapping) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_norway::to_string(functions_doc)?.as_bytes());
    hasher.update(serde_norway::to_string(types_doc)?.as_bytes());
    Ok(format!("sha256:{}", hex::encode(&hasher.finalize()[..8])))
}

fn provenance_header(comment_prefix: &str, digest: &str) -> String {
    format!(
        "{prefix} Generated by gluespec {version} -- do not edit by hand\n\
         {prefix} source digest: {digest}\n",
        prefix = comment_prefix,
        version = crate::VERSION,
    )
}
