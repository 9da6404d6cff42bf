//! Error types for gluespec

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// gluespec errors
///
/// Everything except [`Error::DependencyIndex`] is raised during the
/// merge/parse/resolve phases, before any code is emitted. The pipeline
/// aborts on the first fatal error; partial generated output is never
/// written.
#[derive(Error, Debug)]
pub enum Error {
    #[error("merge conflict at `{path}`: {left} replaced by {right} from a later document")]
    MergeConflict {
        path: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("invalid parameter `{text}` in function {function}: {detail}")]
    InvalidModifier {
        function: String,
        text: String,
        detail: String,
    },

    #[error("duplicate parameter `{name}` in function {function}")]
    DuplicateParameter { function: String, name: String },

    #[error("dependency declared on unknown parameter `{name}` of function {function}")]
    UnknownDependency { function: String, name: String },

    #[error("unknown type {name} referenced by function {function}")]
    UnknownType { function: String, name: String },

    #[error("default `{name}` of type {type_name} has no literal for language {language}")]
    UnknownDefault {
        type_name: String,
        name: String,
        language: String,
    },

    #[error(
        "template for {type_name} parameter `{param}` of function {function} references \
         dependency index {index}, but only {available} dependencies are declared"
    )]
    DependencyIndex {
        function: String,
        param: String,
        type_name: String,
        index: usize,
        available: usize,
    },

    #[error("no code generator registered for language {0}")]
    UnsupportedLanguage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
