// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph model replayed by retrace.
//! Nodes and links with O(1) id lookup, plus canonical hashing so two graph
//! states can be compared independently of sequence order.

mod graph;
mod model;

pub use graph::{CanonicalError, Graph, GraphSnapshot, Hash32, RemovedNode};
pub use model::{
    normalize_class, Direction, InvalidDirection, Link, LinkId, Node, NodeId, Value, DEFAULT_LABEL,
};
