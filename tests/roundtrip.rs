//! Round-trip properties: for acyclic inputs and union-free schemas,
//! validate-then-serialize equals a single validation, and the JSON text
//! round-trips through the reader.

use conforma::{FieldNode, GraphBuilder, Map, Options, SchemaNode, SerMode, Value};
use proptest::prelude::*;

fn profile_graph() -> (conforma::SchemaGraph, conforma::NodeId) {
    let mut builder = GraphBuilder::new();
    let name = builder.push(SchemaNode::string());
    let count = builder.push(SchemaNode::integer());
    let tag = builder.push(SchemaNode::string());
    let tags = builder.push(SchemaNode::sequence(tag));
    let flag = builder.push(SchemaNode::boolean());
    let root = builder.push(SchemaNode::struct_of([
        ("name".into(), FieldNode::required(name)),
        ("count".into(), FieldNode::required(count)),
        ("tags".into(), FieldNode::required(tags)),
        ("active".into(), FieldNode::required(flag)),
    ]));
    (builder.finish().unwrap(), root)
}

fn profile_input(name: &str, count: i64, tags: &[String], active: bool) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), name.into());
    map.insert("count".into(), count.into());
    map.insert(
        "tags".into(),
        tags.iter().map(|t| Value::from(t.as_str())).collect(),
    );
    map.insert("active".into(), active.into());
    Value::map(map)
}

#[test]
fn validate_then_serialize_is_idempotent() {
    let (graph, root) = profile_graph();
    let input = profile_input("ada", 3, &["x".into(), "y".into()], true);

    let validated = Options::default().validate(&graph, root, input).unwrap();
    let serialized = Options::default()
        .serialize(&graph, root, &validated, SerMode::Native)
        .unwrap();
    assert_eq!(serialized, validated);
}

#[test]
fn json_text_roundtrips_through_the_reader() {
    let (graph, root) = profile_graph();
    let input = profile_input("ada", 3, &["x".into()], false);

    let validated = Options::default().validate(&graph, root, input).unwrap();
    let text = Options::default().to_json(&graph, root, &validated).unwrap();
    let reparsed = Options::default()
        .validate_json(&graph, root, text.as_bytes())
        .unwrap();
    assert_eq!(reparsed, validated);
}

proptest! {
    #[test]
    fn roundtrip_idempotence_holds_for_arbitrary_profiles(
        name in ".*",
        count in any::<i64>(),
        tags in proptest::collection::vec("[a-z]{0,8}", 0..8),
        active in any::<bool>(),
    ) {
        let (graph, root) = profile_graph();
        let input = profile_input(&name, count, &tags, active);

        let validated = Options::default().validate(&graph, root, input).unwrap();
        let serialized = Options::default()
            .serialize(&graph, root, &validated, SerMode::Native)
            .unwrap();
        prop_assert_eq!(&serialized, &validated);

        // And through JSON text, for good measure.
        let text = Options::default().to_json(&graph, root, &validated).unwrap();
        let reparsed = Options::default()
            .validate_json(&graph, root, text.as_bytes())
            .unwrap();
        prop_assert_eq!(&reparsed, &validated);
    }
}
