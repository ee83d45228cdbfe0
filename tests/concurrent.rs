//! A schema graph is built once and shared across threads; every call
//! gets its own run state, so parallel validations need no coordination.

use std::sync::Arc;
use std::thread;

use conforma::{FieldNode, GraphBuilder, Options, SchemaNode, Value};

#[test]
fn concurrent_validations_share_one_graph() {
    let mut builder = GraphBuilder::new();
    let name = builder.push(SchemaNode::string().min_len(1));
    let count = builder.push(SchemaNode::integer().ge(0.0));
    let root = builder.push(SchemaNode::struct_of([
        ("name".into(), FieldNode::required(name)),
        ("count".into(), FieldNode::required(count)),
    ]));
    let graph = Arc::new(builder.finish().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|thread_index| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                for i in 0..200 {
                    let doc = format!(r#"{{"name": "t{thread_index}", "count": {i}}}"#);
                    let out = Options::default()
                        .validate_json(&graph, root, doc.as_bytes())
                        .unwrap();
                    let Value::Map(map) = &out else { panic!() };
                    assert_eq!(map.read().len(), 2);

                    // Failures on one thread are local to its own call.
                    let err = Options::default()
                        .validate_json(&graph, root, br#"{"name": "", "count": -1}"#)
                        .unwrap_err();
                    let conforma::ValidationFailure::Report(report) = err else {
                        panic!("expected report");
                    };
                    assert_eq!(report.len(), 2);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn values_and_graphs_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<conforma::SchemaGraph>();
    assert_send_sync::<Value>();
    assert_send_sync::<conforma::Options>();
}
