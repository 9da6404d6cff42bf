//! Document merging — folds layered definition documents into one
//!
//! Definition files are applied in command-line order; a later document
//! overrides or extends what the earlier ones declared. Mappings merge
//! recursively, scalars and sequences are replaced wholesale. Mapping keys
//! keep their original insertion position when overridden, so the merged
//! document preserves the declaration order of the first document that
//! introduced each function or type.

use std::path::Path;

use serde_norway::{Mapping, Value};
use tracing::warn;

use crate::error::Result;

/// Deep-merge a sequence of parsed documents, later documents winning.
///
/// Pure data transformation; shape conflicts (mapping on one side, scalar on
/// the other) are resolved in favor of the later document and logged as a
/// warning rather than treated as fatal.
pub fn merge_documents<I>(documents: I) -> Mapping
where
    I: IntoIterator<Item = Mapping>,
{
    let mut merged = Mapping::new();
    for document in documents {
        merge_mapping(&mut merged, document, "");
    }
    merged
}

fn merge_mapping(base: &mut Mapping, overlay: Mapping, path: &str) {
    for (key, value) in overlay {
        let child_path = join_path(path, &key);
        if let Some(existing) = base.get_mut(&key) {
            merge_value(existing, value, &child_path);
        } else {
            base.insert(key, value);
        }
    }
}

fn merge_value(base: &mut Value, overlay: Value, path: &str) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            merge_mapping(base_map, overlay_map, path);
        }
        (base_slot, overlay) => {
            let left = kind_of(base_slot);
            let right = kind_of(&overlay);
            if (left == "mapping") != (right == "mapping") {
                warn!("merge conflict at `{path}`: {left} replaced by {right} from a later document");
            }
            *base_slot = overlay;
        }
    }
}

fn join_path(path: &str, key: &Value) -> String {
    let name = match key {
        Value::String(s) => s.clone(),
        other => serde_norway::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| "?".to_string()),
    };
    if path.is_empty() {
        name
    } else {
        format!("{path}.{name}")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Load a single definition document from disk.
///
/// `.json` files go through serde_json, everything else is parsed as YAML.
/// The document root must be a mapping.
pub fn load_document(path: &Path) -> Result<Mapping> {
    let text = std::fs::read_to_string(path)?;
    let document: Mapping = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text)?
    } else {
        serde_norway::from_str(&text)?
    };
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(yaml: &str) -> Mapping {
        serde_norway::from_str(yaml).unwrap()
    }

    #[test]
    fn scalar_overridden_by_later_document() {
        let merged = merge_documents([
            doc("f:\n  RETURN: INTEGER\n  PARAMS: GRAPH graph"),
            doc("f:\n  RETURN: REAL"),
        ]);
        let f = merged.get("f").unwrap().as_mapping().unwrap();
        assert_eq!(f.get("RETURN").unwrap().as_str(), Some("REAL"));
        assert_eq!(f.get("PARAMS").unwrap().as_str(), Some("GRAPH graph"));
    }

    #[test]
    fn nested_mappings_merge_recursively() {
        let merged = merge_documents([
            doc("f:\n  NAME:\n    R: one\n    Python: two"),
            doc("f:\n  NAME:\n    Python: three"),
        ]);
        let names = merged
            .get("f")
            .unwrap()
            .as_mapping()
            .unwrap()
            .get("NAME")
            .unwrap()
            .as_mapping()
            .unwrap();
        assert_eq!(names.get("R").unwrap().as_str(), Some("one"));
        assert_eq!(names.get("Python").unwrap().as_str(), Some("three"));
    }

    #[test]
    fn sequences_are_replaced_wholesale() {
        let merged = merge_documents([
            doc("f:\n  FLAGS: [progress, deprecated]"),
            doc("f:\n  FLAGS: [internal]"),
        ]);
        let flags = merged
            .get("f")
            .unwrap()
            .as_mapping()
            .unwrap()
            .get("FLAGS")
            .unwrap()
            .as_sequence()
            .unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].as_str(), Some("internal"));
    }

    #[test]
    fn insertion_order_survives_overrides() {
        let merged = merge_documents([
            doc("a:\n  RETURN: ERROR\nb:\n  RETURN: ERROR"),
            doc("b:\n  RETURN: INTEGER\nc:\n  RETURN: ERROR"),
        ]);
        let order: Vec<&str> = merged.keys().map(|k| k.as_str().unwrap()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn shape_conflict_resolves_to_later_document() {
        let merged = merge_documents([
            doc("f:\n  NAME: plain"),
            doc("f:\n  NAME:\n    R: dotted"),
        ]);
        let name = merged
            .get("f")
            .unwrap()
            .as_mapping()
            .unwrap()
            .get("NAME")
            .unwrap();
        assert!(name.is_mapping());
    }

    #[test]
    fn empty_input_yields_empty_document() {
        let merged = merge_documents(std::iter::empty());
        assert!(merged.is_empty());
    }
}
