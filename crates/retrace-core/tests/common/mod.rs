// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use retrace_core::{AutoPlayConfig, ReplaySession, RunFile};
use retrace_graph::{Graph, Hash32, LinkId, NodeId};
use serde_json::{json, Value};

/// Parses a run document written with `json!`.
pub fn run(doc: &Value) -> RunFile {
    serde_json::from_value(doc.clone()).expect("run document parses")
}

/// Session over `frames`, starting from an empty graph.
pub fn session(frames: &Value) -> ReplaySession {
    session_with(&json!({ "nodes": [], "links": [] }), frames)
}

/// Session over `frames`, starting from `graph`.
pub fn session_with(graph: &Value, frames: &Value) -> ReplaySession {
    let doc = json!({ "meta": { "filename": "test" }, "graph": graph, "frames": frames });
    ReplaySession::new(run(&doc), AutoPlayConfig::default())
}

/// Canonical hash; ignores sequence order.
pub fn hash(g: &Graph) -> Hash32 {
    g.compute_hash().expect("canonical encoding")
}

/// Sorted node ids.
pub fn node_ids(g: &Graph) -> Vec<NodeId> {
    let mut ids: Vec<_> = g.nodes().iter().map(|n| n.id).collect();
    ids.sort_unstable();
    ids
}

/// Sorted link ids.
pub fn link_ids(g: &Graph) -> Vec<LinkId> {
    let mut ids: Vec<_> = g.links().iter().map(|l| l.id).collect();
    ids.sort_unstable();
    ids
}
