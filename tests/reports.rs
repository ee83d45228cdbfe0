//! Error collector tests: sibling aggregation, deterministic ordering,
//! the report wire shape, and serializer fail-fast contrast.

use conforma::{
    ErrorKind, FieldNode, GraphBuilder, Options, PathSegment, SchemaNode, SerError, SerMode,
    ValidationFailure, Value,
};
use regex::Regex;

fn report(err: ValidationFailure) -> conforma::ValidationReport {
    match err {
        ValidationFailure::Report(report) => report,
        other => panic!("expected report, got {other:?}"),
    }
}

fn profile_graph() -> (conforma::SchemaGraph, conforma::NodeId) {
    let mut builder = GraphBuilder::new();
    let name = builder.push(
        SchemaNode::string()
            .min_len(1)
            .pattern(Regex::new(r"^[a-z]+$").unwrap()),
    );
    let age = builder.push(SchemaNode::integer().ge(0.0).le(150.0));
    let tag = builder.push(SchemaNode::string());
    let tags = builder.push(SchemaNode::sequence(tag));
    let root = builder.push(SchemaNode::struct_of([
        ("name".into(), FieldNode::required(name)),
        ("age".into(), FieldNode::required(age)),
        ("tags".into(), FieldNode::required(tags)),
    ]));
    (builder.finish().unwrap(), root)
}

#[test]
fn all_sibling_failures_are_reported_in_one_pass() {
    let (graph, root) = profile_graph();
    let err = Options::default()
        .validate_json(&graph, root, br#"{"name": "UPPER", "age": -3, "tags": [1, "ok", 2]}"#)
        .unwrap_err();
    let report = report(err);

    // name fails its pattern, age its bound, and two sequence elements
    // their type (int -> string is not a documented coercion); none of
    // them masks the others.
    assert_eq!(report.len(), 4);

    let codes: Vec<_> = report.errors().iter().map(|e| e.kind.code()).collect();
    assert_eq!(
        codes,
        vec![
            "constraint_violation",
            "constraint_violation",
            "type_mismatch",
            "type_mismatch",
        ]
    );
}

#[test]
fn report_order_follows_declaration_and_input_order() {
    let (graph, root) = profile_graph();
    let err = Options::default()
        .validate_json(&graph, root, br#"{"tags": [1], "age": -3, "name": "UPPER"}"#)
        .unwrap_err();
    let first = report(err);

    // Re-validating the same document gives the identical report, and the
    // entries follow field declaration order, not input order.
    let err = Options::default()
        .validate_json(&graph, root, br#"{"tags": [1], "age": -3, "name": "UPPER"}"#)
        .unwrap_err();
    let second = report(err);
    assert_eq!(first, second);

    let paths: Vec<_> = report_paths(&first);
    assert_eq!(
        paths,
        vec![
            vec![PathSegment::Field("name".into())],
            vec![PathSegment::Field("age".into())],
            vec![PathSegment::Field("tags".into()), PathSegment::Index(0)],
        ]
    );
}

fn report_paths(report: &conforma::ValidationReport) -> Vec<Vec<PathSegment>> {
    report
        .errors()
        .iter()
        .map(|e| e.path.iter().rev().cloned().collect())
        .collect()
}

#[test]
fn missing_and_defaults() {
    let mut builder = GraphBuilder::new();
    let int = builder.push(SchemaNode::integer());
    let root = builder.push(SchemaNode::struct_of([
        ("required".into(), FieldNode::required(int)),
        ("defaulted".into(), FieldNode::required(int).with_default(Value::Int(7))),
        ("optional".into(), FieldNode::optional(int)),
    ]));
    let graph = builder.finish().unwrap();

    let err = Options::default()
        .validate_json(&graph, root, b"{}")
        .unwrap_err();
    let r = report(err);
    assert_eq!(r.len(), 1);
    assert_eq!(r.errors()[0].kind, ErrorKind::Missing);

    let out = Options::default()
        .validate_json(&graph, root, br#"{"required": 1}"#)
        .unwrap();
    let expected: Value = [("required", 1_i64), ("defaulted", 7_i64)]
        .into_iter()
        .collect();
    assert_eq!(out, expected);
}

#[test]
fn aliases_are_consulted_when_the_primary_name_is_absent() {
    let mut builder = GraphBuilder::new();
    let int = builder.push(SchemaNode::integer());
    let root = builder.push(SchemaNode::struct_of([(
        "count".into(),
        FieldNode::required(int).aliased("n"),
    )]));
    let graph = builder.finish().unwrap();

    let out = Options::default()
        .validate_json(&graph, root, br#"{"n": 3}"#)
        .unwrap();
    let expected: Value = [("count", 3_i64)].into_iter().collect();
    assert_eq!(out, expected);
}

#[test]
fn forbidden_extra_keys_each_get_an_entry() {
    let mut builder = GraphBuilder::new();
    let int = builder.push(SchemaNode::integer());
    let root = builder.push(
        SchemaNode::struct_of([("a".into(), FieldNode::required(int))]).forbid_extra(),
    );
    let graph = builder.finish().unwrap();

    let err = Options::default()
        .validate_json(&graph, root, br#"{"a": 1, "x": 2, "y": 3}"#)
        .unwrap_err();
    let r = report(err);
    assert_eq!(r.len(), 2);
    assert!(r
        .errors()
        .iter()
        .all(|e| e.kind == ErrorKind::ExtraForbidden));
}

#[test]
fn struct_output_is_reordered_to_declaration_order() {
    let mut builder = GraphBuilder::new();
    let int = builder.push(SchemaNode::integer());
    let root = builder.push(SchemaNode::struct_of([
        ("first".into(), FieldNode::required(int)),
        ("second".into(), FieldNode::required(int)),
    ]));
    let graph = builder.finish().unwrap();

    let out = Options::default()
        .validate_json(&graph, root, br#"{"second": 2, "first": 1}"#)
        .unwrap();
    let Value::Map(map) = &out else { panic!() };
    let keys: Vec<_> = map.read().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec![Value::from("first"), Value::from("second")]);
}

#[test]
fn mapping_preserves_insertion_order() {
    let mut builder = GraphBuilder::new();
    let string = builder.push(SchemaNode::string());
    let int = builder.push(SchemaNode::integer());
    let root = builder.push(SchemaNode::mapping(string, int));
    let graph = builder.finish().unwrap();

    let out = Options::default()
        .validate_json(&graph, root, br#"{"z": 1, "a": 2, "m": 3}"#)
        .unwrap();
    let Value::Map(map) = &out else { panic!() };
    let keys: Vec<_> = map.read().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![Value::from("z"), Value::from("a"), Value::from("m")]
    );
}

#[test]
fn wire_shape_has_loc_msg_type_input() {
    let (graph, root) = profile_graph();
    let err = Options::default()
        .validate_json(&graph, root, br#"{"name": "ok", "age": "old", "tags": []}"#)
        .unwrap_err();
    let r = report(err);
    assert_eq!(r.len(), 1);

    let Value::Seq(entries) = r.to_json_value() else {
        panic!("expected sequence");
    };
    let entries = entries.read();
    let Value::Map(entry) = &entries[0] else {
        panic!("expected mapping");
    };
    let entry = entry.read();
    assert_eq!(
        entry.get_str("loc"),
        Some(&Value::seq(vec!["age".into()]))
    );
    assert_eq!(entry.get_str("type"), Some(&Value::from("type_mismatch")));
    assert_eq!(entry.get_str("input"), Some(&Value::from("old")));
    assert!(entry.get_str("msg").is_some());

    // And the whole report renders as JSON text.
    let text = r.to_json_string();
    assert!(text.starts_with('['));
    assert!(text.contains("\"type_mismatch\""));
}

#[test]
fn strictness_layering() {
    let mut builder = GraphBuilder::new();
    let lax_int = builder.push(SchemaNode::integer());
    let strict_int = builder.push(SchemaNode::integer().strict());
    let root = builder.push(SchemaNode::struct_of([
        ("lax".into(), FieldNode::required(lax_int)),
        ("strict".into(), FieldNode::required(strict_int)),
    ]));
    let graph = builder.finish().unwrap();

    // The node-level strict flag binds even in a lax call.
    let err = Options::default()
        .validate_json(&graph, root, br#"{"lax": "1", "strict": "1"}"#)
        .unwrap_err();
    let r = report(err);
    assert_eq!(r.len(), 1);
    assert_eq!(
        report_paths(&r),
        vec![vec![PathSegment::Field("strict".into())]]
    );

    // The call-level flag tightens everything.
    let err = Options::default()
        .with_strict()
        .validate_json(&graph, root, br#"{"lax": "1", "strict": "1"}"#)
        .unwrap_err();
    assert_eq!(report(err).len(), 2);
}

#[test]
fn serializer_stops_at_the_first_error() {
    let (graph, root) = profile_graph();
    // Two fields are wrong, but serialization reports only the first.
    let bad: Value = [
        ("name", Value::Int(1)),
        ("age", Value::from("x")),
        ("tags", Value::seq(vec![])),
    ]
    .into_iter()
    .collect();
    let err = Options::default()
        .serialize(&graph, root, &bad, SerMode::Native)
        .unwrap_err();
    assert_eq!(
        err,
        SerError::TypeMismatch {
            expected: "string".into(),
            found: "int".into(),
        }
    );
}
