//! Partial JSON tolerance through the validate entry point, plus string
//! cache configuration.

use conforma::{
    CacheConfig, CacheMode, GraphBuilder, Options, ParseErrorKind, SchemaNode, ValidationFailure,
    Value,
};

fn string_list_graph() -> (conforma::SchemaGraph, conforma::NodeId) {
    let mut builder = GraphBuilder::new();
    let string = builder.push(SchemaNode::string());
    let root = builder.push(SchemaNode::sequence(string));
    (builder.finish().unwrap(), root)
}

#[test]
fn partial_input_validates_the_deepest_prefix() {
    let (graph, root) = string_list_graph();
    let out = Options::default()
        .with_partial()
        .validate_json(&graph, root, br#"["aa", "bb", "c"#)
        .unwrap();
    assert_eq!(out, Value::seq(vec!["aa".into(), "bb".into()]));
}

#[test]
fn without_partial_the_same_input_is_a_parse_error() {
    let (graph, root) = string_list_graph();
    let err = Options::default()
        .validate_json(&graph, root, br#"["aa", "bb", "c"#)
        .unwrap_err();
    let ValidationFailure::Parse(parse) = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert_eq!(parse.kind, ParseErrorKind::UnexpectedEof);
}

#[test]
fn partial_object_drops_the_incomplete_entry() {
    let mut builder = GraphBuilder::new();
    let int = builder.push(SchemaNode::integer());
    let string = builder.push(SchemaNode::string());
    let root = builder.push(SchemaNode::mapping(string, int));
    let graph = builder.finish().unwrap();

    let out = Options::default()
        .with_partial()
        .validate_json(&graph, root, br#"{"a": 1, "b": 2, "c"#)
        .unwrap();
    let expected: Value = [("a", 1_i64), ("b", 2_i64)].into_iter().collect();
    assert_eq!(out, expected);
}

#[test]
fn partial_mode_does_not_excuse_schema_errors() {
    let (graph, root) = string_list_graph();
    let err = Options::default()
        .with_partial()
        .with_strict()
        .validate_json(&graph, root, br#"["aa", 42, "c"#)
        .unwrap_err();
    let ValidationFailure::Report(report) = err else {
        panic!("expected report, got {err:?}");
    };
    assert_eq!(report.len(), 1);
}

#[test]
fn private_cache_configuration_is_honored() {
    let (graph, root) = string_list_graph();
    // A tiny cache with key-only interning still validates correctly.
    let out = Options::default()
        .with_cache(CacheConfig {
            mode: CacheMode::Keys,
            capacity: 8,
            max_len: 16,
        })
        .validate_json(&graph, root, br#"["x", "y"]"#)
        .unwrap();
    assert_eq!(out, Value::seq(vec!["x".into(), "y".into()]));
}

#[test]
fn no_cache_mode_works() {
    let (graph, root) = string_list_graph();
    let out = Options::default()
        .with_cache(CacheConfig {
            mode: CacheMode::None,
            capacity: 8,
            max_len: 16,
        })
        .validate_json(&graph, root, br#"["x"]"#)
        .unwrap();
    assert_eq!(out, Value::seq(vec!["x".into()]));
}
