// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # gluespec — schema-driven glue-code generation
//!
//! Compiles YAML definition documents into per-language binding code.
//!
//! ## Core Concept
//!
//! gluespec treats **definition documents** as the source of truth. One set
//! of documents describes a library's functions (parameters, directions,
//! dependencies, flags); another describes how each abstract type is spelled
//! in each target language (conversion templates, defaults). From these,
//! gluespec emits wrapper code per language:
//!
//! - **R** — high-level wrappers around `.Call` native glue
//! - **Python** — typed ctypes wrappers
//!
//! Documents layer: later documents override earlier ones key by key, so a
//! local overlay can patch a handful of functions without copying the whole
//! upstream catalogue.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gluespec::{generate, GenerateRequest};
//!
//! let request = GenerateRequest {
//!     language: "R".into(),
//!     function_docs: vec![serde_norway::from_str(r#"
//!       lib_degree:
//!         PARAMS: GRAPH graph, OUT VECTOR res
//!         RETURN: ERROR
//!     "#)?],
//!     type_docs: vec![serde_norway::from_str(r#"
//!       ERROR:
//!         R: {OUTCONV: {OUT: "stop_on_error(res)"}}
//!       GRAPH:
//!         R: {INCONV: {IN: "stopifnot(is_graph(%I%))"}}
//!       VECTOR:
//!         R: {OUTCONV: {OUT: "%I% <- as.vector(%I%)"}}
//!     "#)?],
//!     template: None,
//! };
//!
//! let code = generate::run(&request)?;
//! println!("{code}");
//! ```
//!
//! ## Pipeline
//!
//! `merge` folds the layered documents, `model` turns function properties
//! into typed descriptors (parsing the `PARAMS` and `DEPS` grammars along
//! the way), `registry` does the same for types, and `generate` resolves
//! every referenced type before handing the model to a language backend.
//! Definition errors are fatal: no output is written for a model that does
//! not fully resolve.

pub mod deps;
pub mod error;
pub mod generate;
pub mod merge;
pub mod model;
pub mod params;
pub mod registry;
pub mod subst;

pub use deps::DependencyMap;
pub use error::{Error, Result};
pub use generate::{backend_for, CodeGenerator, GenerateRequest, Surface, LANGUAGES};
pub use merge::{load_document, merge_documents};
pub use model::{build_model, FunctionDescriptor};
pub use params::{ParamMode, ParamSpec};
pub use registry::{TypeDescriptor, TypeRegistry};

/// Version of the gluespec crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
