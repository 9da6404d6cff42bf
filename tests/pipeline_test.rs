//! End-to-end tests of the generation pipeline: layered document merging,
//! model building, type resolution, and backend emission.

use gluespec::{generate, load_document, Error, GenerateRequest};
use pretty_assertions::assert_eq;
use serde_norway::Mapping;
use std::io::Write;

fn doc(yaml: &str) -> Mapping {
    serde_norway::from_str(yaml).unwrap()
}

const TYPES: &str = r#"
ERROR:
  R:
    OUTCONV:
      OUT: "stop_on_error(res)"
  Python:
    OUTCONV:
      OUT: "handle_error(%C%)"
BOOLEAN:
  DEFAULT:
    "True":
      R: "TRUE"
      Python: "True"
  R:
    INCONV:
      IN: "%I% <- as.logical(%I%)"
  Python:
    PY_TYPE: bool
    INCONV:
      IN: "%C% = c_bool(%I%)"
    CALL: "byref(%C%)"
GRAPH:
  R:
    INCONV:
      IN: "stopifnot(is_graph(%I%))"
  Python:
    PY_TYPE: Graph
    INCONV:
      IN: "%C% = %I%._as_parameter_"
    CALL: "byref(%C%)"
VECTOR:
  R:
    INCONV:
      IN: "%I% <- as.numeric(%I%)"
    OUTCONV:
      OUT: "%I% <- as.vector(%I%)"
  Python:
    PY_TYPE: "List[float]"
    INCONV:
      IN: "%C% = as_c_vector(%I%)"
      OUT: "%C% = c_vector()"
    CALL: "byref(%C%)"
    OUTCONV:
      OUT: "%I% = %C%.to_list()"
CONNECTEDNESS:
  DEFAULT:
    WEAK:
      R: '"weak"'
      Python: Connectedness.WEAK
  R:
    INCONV:
      IN: "%I% <- match.arg(%I%, c('weak', 'strong'))"
  Python:
    PY_TYPE: Connectedness
    INCONV:
      IN: "%C% = c_int(int(%I%))"
    CALL: "%C%"
"#;

fn request(language: &str, functions: &str) -> GenerateRequest {
    GenerateRequest {
        language: language.into(),
        function_docs: vec![doc(functions)],
        type_docs: vec![doc(TYPES)],
        template: None,
    }
}

#[test]
fn later_function_documents_override_earlier_ones() {
    let base = doc("lib_a:\n  PARAMS: GRAPH graph\n  RETURN: ERROR\n");
    let overlay = doc("lib_a:\n  PARAMS: GRAPH graph, BOOLEAN loops=True\n");
    let req = GenerateRequest {
        language: "R".into(),
        function_docs: vec![base, overlay],
        type_docs: vec![doc(TYPES)],
        template: None,
    };
    let out = generate::run(&req).unwrap();
    // The overlay replaced PARAMS wholesale; RETURN survives from the base.
    assert!(out.contains("lib_a <- function(graph, loops=TRUE)"));
    assert!(out.contains("stop_on_error(res)"));
}

#[test]
fn functions_are_emitted_in_document_order() {
    let out = generate::run(&request(
        "R",
        "lib_zebra:\n  RETURN: ERROR\nlib_apple:\n  RETURN: ERROR\nlib_mango:\n  RETURN: ERROR\n",
    ))
    .unwrap();
    let zebra = out.find("lib_zebra").unwrap();
    let apple = out.find("lib_apple").unwrap();
    let mango = out.find("lib_mango").unwrap();
    assert!(zebra < apple && apple < mango);
}

#[test]
fn bare_parameters_default_to_inputs() {
    let out = generate::run(&request(
        "R",
        "lib_f:\n  PARAMS: GRAPH graph, VECTOR weights\n  RETURN: ERROR\n",
    ))
    .unwrap();
    assert!(out.contains("function(graph, weights)"));
    assert!(out.contains("weights <- as.numeric(weights)"));
}

#[test]
fn ignored_functions_are_skipped_per_language() {
    let functions = "lib_r_only:\n  IGNORE: Python\n  RETURN: ERROR\n\
                     lib_both:\n  RETURN: ERROR\n";
    let r = generate::run(&request("R", functions)).unwrap();
    let python = generate::run(&request("Python", functions)).unwrap();
    assert!(r.contains("lib_r_only"));
    assert!(!python.contains("lib_r_only"));
    assert!(r.contains("lib_both") && python.contains("lib_both"));
}

#[test]
fn defaults_resolve_through_the_language_vocabulary() {
    let functions =
        "lib_components:\n  PARAMS: GRAPH graph, CONNECTEDNESS mode=WEAK\n  RETURN: ERROR\n";
    let r = generate::run(&request("R", functions)).unwrap();
    let python = generate::run(&request("Python", functions)).unwrap();
    assert!(r.contains(r#"mode="weak""#));
    assert!(python.contains("mode: Connectedness = Connectedness.WEAK"));
}

#[test]
fn unknown_default_reference_passes_through_verbatim() {
    let out = generate::run(&request(
        "R",
        "lib_f:\n  PARAMS: VECTOR weights=NULL\n  RETURN: ERROR\n",
    ))
    .unwrap();
    assert!(out.contains("weights=NULL"));
}

#[test]
fn unknown_type_is_fatal_with_no_output() {
    let err = generate::run(&request(
        "R",
        "lib_a:\n  RETURN: ERROR\nlib_b:\n  PARAMS: MYSTERY x\n  RETURN: ERROR\n",
    ))
    .unwrap_err();
    match err {
        Error::UnknownType { function, name } => {
            assert_eq!(function, "lib_b");
            assert_eq!(name, "MYSTERY");
        }
        other => panic!("expected UnknownType, got {other}"),
    }
}

#[test]
fn unknown_dependency_is_fatal() {
    let err = generate::run(&request(
        "R",
        "lib_f:\n  PARAMS: GRAPH graph\n  DEPS: graph ON missing\n  RETURN: ERROR\n",
    ))
    .unwrap_err();
    assert!(matches!(err, Error::UnknownDependency { .. }));
}

#[test]
fn out_of_range_dependency_index_is_fatal() {
    let mut types = doc(TYPES);
    types.insert(
        "VERTEXSET".into(),
        doc("R:\n  HEADER: \"%I%=all_vertices(%I1%)\"\n").into(),
    );
    let req = GenerateRequest {
        language: "R".into(),
        // `vids` declares no dependencies, so `%I1%` cannot resolve.
        function_docs: vec![doc("lib_f:\n  PARAMS: VERTEXSET vids\n  RETURN: ERROR\n")],
        type_docs: vec![types],
        template: None,
    };
    let err = generate::run(&req).unwrap_err();
    assert!(matches!(
        err,
        Error::DependencyIndex { index: 1, available: 0, .. }
    ));
}

#[test]
fn unsupported_language_fails_before_reading_documents() {
    let req = GenerateRequest {
        language: "Fortran".into(),
        // An invalid document: never reached.
        function_docs: vec![doc("lib_f:\n  PARAMS: 17\n")],
        type_docs: Vec::new(),
        template: None,
    };
    let err = generate::run(&req).unwrap_err();
    assert!(matches!(err, Error::UnsupportedLanguage(l) if l == "Fortran"));
}

#[test]
fn generation_is_idempotent() {
    let functions = "lib_components:\n  PARAMS: GRAPH graph, CONNECTEDNESS mode=WEAK, \
                     PRIMARY OUT VECTOR membership, OUT VECTOR sizes\n  RETURN: ERROR\n";
    let first = generate::run(&request("Python", functions)).unwrap();
    let second = generate::run(&request("Python", functions)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn provenance_header_names_the_generator() {
    let out = generate::run(&request("R", "lib_f:\n  RETURN: ERROR\n")).unwrap();
    let first_line = out.lines().next().unwrap();
    assert!(first_line.starts_with("# Generated by gluespec"));
    assert!(out.lines().nth(1).unwrap().starts_with("# source digest: sha256:"));
}

#[test]
fn template_marker_is_replaced() {
    let req = GenerateRequest {
        template: Some("# prologue\n%%functions%%\n# epilogue\n".into()),
        ..request("R", "lib_f:\n  RETURN: ERROR\n")
    };
    let out = generate::run(&req).unwrap();
    assert!(out.starts_with("# prologue\n"));
    assert!(out.ends_with("# epilogue\n"));
    assert!(out.contains("lib_f <- function()"));
}

#[test]
fn primary_output_generates_both_surfaces_in_both_backends() {
    let functions = "lib_split:\n  PARAMS: GRAPH graph, PRIMARY OUT VECTOR membership, \
                     OUT VECTOR sizes\n  RETURN: ERROR\n";
    let r = generate::run(&request("R", functions)).unwrap();
    let python = generate::run(&request("Python", functions)).unwrap();
    assert!(r.contains("lib_split <- function(graph)"));
    assert!(r.contains("lib_split.all <- function(graph)"));
    assert!(python.contains("def lib_split(graph: Graph)"));
    assert!(python.contains("def lib_split_all(graph: Graph)"));
}

#[test]
fn load_document_reads_yaml_and_json() {
    let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(yaml, "lib_f:\n  RETURN: ERROR\n").unwrap();
    let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(json, "{{\"lib_g\": {{\"RETURN\": \"ERROR\"}}}}").unwrap();

    let yaml_doc = load_document(yaml.path()).unwrap();
    let json_doc = load_document(json.path()).unwrap();
    assert!(yaml_doc.contains_key("lib_f"));
    assert!(json_doc.contains_key("lib_g"));
}
