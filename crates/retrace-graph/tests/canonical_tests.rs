// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use retrace_graph::{Direction, Graph, GraphSnapshot, Link, Node, Value};

#[test]
fn canonical_hash_ignores_sequence_order() {
    let a = Graph::from_parts(
        vec![Node::new(1), Node::new(2), Node::new(3)],
        vec![Link::new(10, 1, 2), Link::new(11, 2, 3)],
    );
    let b = Graph::from_parts(
        vec![Node::new(3), Node::new(1), Node::new(2)],
        vec![Link::new(11, 2, 3), Link::new(10, 1, 2)],
    );
    assert_ne!(a, b, "sequence order differs");
    assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
}

#[test]
fn canonical_hash_sees_content_changes() {
    let mut g = Graph::from_parts(vec![Node::new(1)], vec![Link::new(10, 1, 1)]);
    let h0 = g.compute_hash().unwrap();
    g.set_link_direction(10, Direction::Reversed);
    let h1 = g.compute_hash().unwrap();
    assert_ne!(h0, h1);
    g.set_link_direction(10, Direction::Forward);
    assert_eq!(g.compute_hash().unwrap(), h0);
}

#[test]
fn snapshot_parses_run_file_shapes() {
    let json = r#"{
        "nodes": [
            { "id": 1, "value": 5, "label": "A" },
            { "id": 2, "value": [1, 2], "label": "B", "styleClass": "" },
            { "id": 3, "styleClass": "start", "x": 12.5 }
        ],
        "links": [
            { "id": 10, "source": 1, "target": 2, "value": 3, "direction": 1, "label": "L" },
            { "id": 11, "source": 2, "target": 3 }
        ]
    }"#;
    let snap: GraphSnapshot = serde_json::from_str(json).unwrap();
    let g = Graph::from(snap);

    let n2 = g.node(2).unwrap();
    assert_eq!(n2.value, Value::Vector(vec![1.0, 2.0]));
    assert_eq!(n2.style_class, None);

    let n3 = g.node(3).unwrap();
    assert_eq!(n3.label, retrace_graph::DEFAULT_LABEL);
    assert_eq!(n3.css_class().as_deref(), Some("start-node"));

    let l10 = g.link(10).unwrap();
    assert_eq!(l10.direction, Direction::Reversed);
    let l11 = g.link(11).unwrap();
    assert_eq!(l11.value, Value::Scalar(1.0));
    assert_eq!(l11.direction, Direction::Forward);
}

#[test]
fn invalid_direction_is_rejected() {
    let json = r#"{ "id": 1, "source": 1, "target": 2, "direction": 4 }"#;
    assert!(serde_json::from_str::<Link>(json).is_err());
}
