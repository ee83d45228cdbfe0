//! Scalar coercion table, constraints, nullable wrappers and the two
//! serialization modes for non-JSON kinds.

use std::any::Any;
use std::sync::Arc;

use conforma::{
    ErrorKind, GraphBuilder, NodeId, Options, OpaqueValue, SchemaGraph, SchemaNode, SerError,
    SerMode, ValidationFailure, Value,
};

fn single(node: SchemaNode) -> (SchemaGraph, NodeId) {
    let mut builder = GraphBuilder::new();
    let id = builder.push(node);
    (builder.finish().unwrap(), id)
}

fn lax(graph: &SchemaGraph, root: NodeId, input: Value) -> Result<Value, ValidationFailure> {
    Options::default().validate(graph, root, input)
}

fn strict(graph: &SchemaGraph, root: NodeId, input: Value) -> Result<Value, ValidationFailure> {
    Options::default().with_strict().validate(graph, root, input)
}

#[test]
fn int_coercions() {
    let (graph, root) = single(SchemaNode::integer());
    assert_eq!(lax(&graph, root, Value::from("42")).unwrap(), Value::Int(42));
    assert_eq!(lax(&graph, root, Value::from(" 42 ")).unwrap(), Value::Int(42));
    assert_eq!(lax(&graph, root, Value::from(3.0)).unwrap(), Value::Int(3));
    assert_eq!(lax(&graph, root, Value::Bool(true)).unwrap(), Value::Int(1));
    assert!(lax(&graph, root, Value::from(3.5)).is_err());
    assert!(lax(&graph, root, Value::from("3.5")).is_err());

    assert!(strict(&graph, root, Value::from("42")).is_err());
    assert!(strict(&graph, root, Value::from(3.0)).is_err());
    assert_eq!(strict(&graph, root, Value::Int(7)).unwrap(), Value::Int(7));
}

#[test]
fn float_coercions() {
    let (graph, root) = single(SchemaNode::float());
    assert_eq!(lax(&graph, root, Value::Int(3)).unwrap(), Value::from(3.0));
    assert_eq!(
        lax(&graph, root, Value::from("2.5")).unwrap(),
        Value::from(2.5)
    );
    assert!(strict(&graph, root, Value::Int(3)).is_err());
}

#[test]
fn bool_coercions() {
    let (graph, root) = single(SchemaNode::boolean());
    assert_eq!(lax(&graph, root, Value::Int(1)).unwrap(), Value::Bool(true));
    assert_eq!(lax(&graph, root, Value::Int(0)).unwrap(), Value::Bool(false));
    assert_eq!(
        lax(&graph, root, Value::from("TRUE")).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        lax(&graph, root, Value::from("0")).unwrap(),
        Value::Bool(false)
    );
    assert!(lax(&graph, root, Value::Int(2)).is_err());
    assert!(lax(&graph, root, Value::from("yes")).is_err());
    assert!(strict(&graph, root, Value::Int(1)).is_err());
}

#[test]
fn string_and_bytes_coerce_into_each_other_lax_only() {
    let (graph, string_node) = single(SchemaNode::string());
    assert_eq!(
        lax(&graph, string_node, Value::bytes(b"abc".to_vec())).unwrap(),
        Value::from("abc")
    );
    assert!(strict(&graph, string_node, Value::bytes(b"abc".to_vec())).is_err());
    // Numbers never coerce to strings.
    assert!(lax(&graph, string_node, Value::Int(1)).is_err());

    let (graph, bytes_node) = single(SchemaNode::bytes());
    assert_eq!(
        lax(&graph, bytes_node, Value::from("abc")).unwrap(),
        Value::bytes(b"abc".to_vec())
    );
    assert!(strict(&graph, bytes_node, Value::from("abc")).is_err());
}

#[test]
fn invalid_utf8_bytes_do_not_become_strings() {
    let (graph, root) = single(SchemaNode::string());
    assert!(lax(&graph, root, Value::bytes(vec![0xff, 0xfe])).is_err());
}

#[test]
fn null_accepts_only_null() {
    let (graph, root) = single(SchemaNode::null());
    assert_eq!(lax(&graph, root, Value::Null).unwrap(), Value::Null);
    assert!(lax(&graph, root, Value::Int(0)).is_err());
}

#[test]
fn constraints_apply_after_coercion() {
    let (graph, root) = single(SchemaNode::integer().ge(10.0));
    assert_eq!(lax(&graph, root, Value::from("12")).unwrap(), Value::Int(12));

    let err = lax(&graph, root, Value::from("3")).unwrap_err();
    let ValidationFailure::Report(report) = err else {
        panic!("expected report");
    };
    assert_eq!(
        report.errors()[0].kind,
        ErrorKind::BoundViolated { op: ">=", limit: 10.0 }
    );
    // The report echoes the pre-coercion input.
    assert_eq!(report.errors()[0].input, Value::from("3"));
}

#[test]
fn multiple_constraint_violations_are_all_reported() {
    let (graph, root) = single(
        SchemaNode::string()
            .min_len(6)
            .pattern(regex::Regex::new("^[0-9]+$").unwrap()),
    );
    let err = lax(&graph, root, Value::from("ab")).unwrap_err();
    let ValidationFailure::Report(report) = err else {
        panic!("expected report");
    };
    assert_eq!(report.len(), 2);
}

#[test]
fn nullable_accepts_null_or_inner() {
    let mut builder = GraphBuilder::new();
    let int = builder.push(SchemaNode::integer());
    let root = builder.push(SchemaNode::nullable(int));
    let graph = builder.finish().unwrap();

    assert_eq!(lax(&graph, root, Value::Null).unwrap(), Value::Null);
    assert_eq!(lax(&graph, root, Value::from("3")).unwrap(), Value::Int(3));
    assert!(strict(&graph, root, Value::from("3")).is_err());
    assert_eq!(strict(&graph, root, Value::Null).unwrap(), Value::Null);
}

// =============================================================================
// Serialization modes
// =============================================================================

#[derive(Debug)]
struct Token(u32);

impl OpaqueValue for Token {
    fn type_name(&self) -> &str {
        "Token"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn native_mode_keeps_bytes_and_opaque_values() {
    let (graph, bytes_node) = single(SchemaNode::bytes());
    let out = Options::default()
        .serialize(&graph, bytes_node, &Value::bytes(b"raw".to_vec()), SerMode::Native)
        .unwrap();
    assert_eq!(out, Value::bytes(b"raw".to_vec()));

    let (graph, opaque_node) = single(SchemaNode::opaque("Token"));
    let token = Value::opaque(Arc::new(Token(7)));
    let out = Options::default()
        .serialize(&graph, opaque_node, &token, SerMode::Native)
        .unwrap();
    assert_eq!(out, token);
}

#[test]
fn json_mode_lowers_bytes_and_rejects_opaque_values() {
    let (graph, bytes_node) = single(SchemaNode::bytes());
    let out = Options::default()
        .serialize(&graph, bytes_node, &Value::bytes(b"raw".to_vec()), SerMode::Json)
        .unwrap();
    assert_eq!(out, Value::from("raw"));

    assert_eq!(
        Options::default()
            .serialize(&graph, bytes_node, &Value::bytes(vec![0xff]), SerMode::Json)
            .unwrap_err(),
        SerError::InvalidUtf8
    );

    let (graph, opaque_node) = single(SchemaNode::opaque("Token"));
    let token = Value::opaque(Arc::new(Token(7)));
    let err = Options::default()
        .serialize(&graph, opaque_node, &token, SerMode::Json)
        .unwrap_err();
    assert_eq!(err, SerError::Unsupported { kind: "Token".into() });
}

#[test]
fn ser_hook_can_lower_an_opaque_value_for_json() {
    let mut builder = GraphBuilder::new();
    let node = builder.push(SchemaNode::opaque("Token").with_ser_hook(
        conforma::SerHook::plain(|value, _args| match &value {
            Value::Opaque(o) => {
                let token = o
                    .as_any()
                    .downcast_ref::<Token>()
                    .ok_or_else(|| SerError::user("not a Token"))?;
                Ok(Value::from(format!("token:{}", token.0)))
            }
            _ => Err(SerError::user("expected a Token")),
        }),
    ));
    let graph = builder.finish().unwrap();

    let text = Options::default()
        .to_json(&graph, node, &Value::opaque(Arc::new(Token(7))))
        .unwrap();
    assert_eq!(text, r#""token:7""#);
}

#[test]
fn to_json_renders_nonfinite_floats_as_literals() {
    let (graph, root) = single(SchemaNode::float());
    let text = Options::default()
        .to_json(&graph, root, &Value::from(f64::INFINITY))
        .unwrap();
    assert_eq!(text, "Infinity");
}
