// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Indexed graph model mutated by replay.
//!
//! Nodes and links live in plain vectors (the order display layers iterate)
//! with an `id -> index` map per vector. Every mutating method leaves both
//! maps consistent with their vector before it returns; removal shifts the
//! tail of the vector and re-indexes it in the same call.

use ciborium::ser::into_writer;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{normalize_class, Direction, Link, LinkId, Node, NodeId, Value};

/// BLAKE3 digest of a graph's canonical encoding.
pub type Hash32 = [u8; 32];

/// Failure while producing the canonical encoding.
#[derive(Debug, Error)]
pub enum CanonicalError {
    /// CBOR serialization failed.
    #[error("canonical encode failed: {0}")]
    Encode(String),
}

/// Plain `{ nodes, links }` dataset, as loaded from a run file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Node records in display order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Link records in display order.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    /// True when there are neither nodes nor links.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// A node removed together with every link that touched it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// The removed node.
    pub node: Node,
    /// Incident links, in the order they appeared in the link sequence.
    pub links: Vec<Link>,
}

/// Node/link sequences with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_index: FxHashMap<NodeId, usize>,
    link_index: FxHashMap<LinkId, usize>,
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.links == other.links
    }
}

impl From<GraphSnapshot> for Graph {
    fn from(snapshot: GraphSnapshot) -> Self {
        Self::from_parts(snapshot.nodes, snapshot.links)
    }
}

impl Graph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from raw sequences. A repeated id replaces the earlier
    /// element in place, so ids stay unique.
    pub fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut g = Self::new();
        g.load(nodes, links);
        g
    }

    /// Copy of the current sequences.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
        }
    }

    /// Consumes the graph, returning its sequences.
    pub fn into_snapshot(self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes,
            links: self.links,
        }
    }

    /// All nodes in display order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links in display order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Whether the graph has any nodes.
    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Whether the graph has any links.
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    /// True when there are neither nodes nor links.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Looks up a link by id.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.link_index.get(&id).map(|&i| &self.links[i])
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let i = *self.node_index.get(&id)?;
        self.nodes.get_mut(i)
    }

    fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        let i = *self.link_index.get(&id)?;
        self.links.get_mut(i)
    }

    /// Links whose source or target is `id`, in link order.
    pub fn incident_links(&self, id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.touches(id))
    }

    /// Appends a node. If the id already exists the node is replaced in
    /// place and the previous record is returned.
    pub fn add_node(&mut self, node: Node) -> Option<Node> {
        if let Some(&i) = self.node_index.get(&node.id) {
            return Some(std::mem::replace(&mut self.nodes[i], node));
        }
        self.node_index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        None
    }

    /// Appends a link. If the id already exists the link is replaced in
    /// place and the previous record is returned.
    pub fn add_link(&mut self, link: Link) -> Option<Link> {
        if let Some(&i) = self.link_index.get(&link.id) {
            return Some(std::mem::replace(&mut self.links[i], link));
        }
        self.link_index.insert(link.id, self.links.len());
        self.links.push(link);
        None
    }

    /// Removes a node and every incident link. `None` when the id is absent.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RemovedNode> {
        let idx = self.node_index.remove(&id)?;
        let node = self.nodes.remove(idx);
        self.reindex_nodes_from(idx);
        let links = self.remove_links_matching(|l| l.touches(id));
        Some(RemovedNode { node, links })
    }

    /// Removes a link. `None` when the id is absent.
    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let idx = self.link_index.remove(&id)?;
        let link = self.links.remove(idx);
        self.reindex_links_from(idx);
        Some(link)
    }

    /// Removes every link for which `pred` holds, returning them in order.
    pub fn remove_links_matching<F>(&mut self, mut pred: F) -> Vec<Link>
    where
        F: FnMut(&Link) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.links).into_iter().partition(|l| pred(l));
        self.links = kept;
        if !removed.is_empty() {
            self.rebuild_link_index();
        }
        removed
    }

    /// Removes every node for which `pred` holds, returning them in order.
    /// Incident links are left alone.
    pub fn remove_nodes_matching<F>(&mut self, mut pred: F) -> Vec<Node>
    where
        F: FnMut(&Node) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.nodes).into_iter().partition(|n| pred(n));
        self.nodes = kept;
        if !removed.is_empty() {
            self.rebuild_node_index();
        }
        removed
    }

    /// Sets a node's weight, returning the previous one.
    pub fn set_node_value(&mut self, id: NodeId, value: Value) -> Option<Value> {
        self.node_mut(id)
            .map(|n| std::mem::replace(&mut n.value, value))
    }

    /// Sets a link's weight, returning the previous one.
    pub fn set_link_value(&mut self, id: LinkId, value: Value) -> Option<Value> {
        self.link_mut(id)
            .map(|l| std::mem::replace(&mut l.value, value))
    }

    /// Sets or clears (`None` / empty name) a node's style class.
    ///
    /// The outer `Option` is `None` when the node is absent; the inner one is
    /// the previous class.
    pub fn set_node_class(&mut self, id: NodeId, class: Option<String>) -> Option<Option<String>> {
        let class = normalize_class(class);
        self.node_mut(id)
            .map(|n| std::mem::replace(&mut n.style_class, class))
    }

    /// Sets or clears a link's style class. See [`Graph::set_node_class`].
    pub fn set_link_class(&mut self, id: LinkId, class: Option<String>) -> Option<Option<String>> {
        let class = normalize_class(class);
        self.link_mut(id)
            .map(|l| std::mem::replace(&mut l.style_class, class))
    }

    /// Sets a node's label, returning the previous one.
    pub fn set_node_label(&mut self, id: NodeId, label: String) -> Option<String> {
        self.node_mut(id)
            .map(|n| std::mem::replace(&mut n.label, label))
    }

    /// Sets a link's label, returning the previous one.
    pub fn set_link_label(&mut self, id: LinkId, label: String) -> Option<String> {
        self.link_mut(id)
            .map(|l| std::mem::replace(&mut l.label, label))
    }

    /// Sets a link's arrow orientation, returning the previous one.
    pub fn set_link_direction(&mut self, id: LinkId, direction: Direction) -> Option<Direction> {
        self.link_mut(id)
            .map(|l| std::mem::replace(&mut l.direction, direction))
    }

    /// Flips a link's arrow orientation, returning the previous one.
    pub fn toggle_link_direction(&mut self, id: LinkId) -> Option<Direction> {
        self.link_mut(id).map(|l| {
            let prev = l.direction;
            l.direction = prev.toggled();
            prev
        })
    }

    /// Replaces both sequences wholesale and returns the previous contents.
    pub fn replace(&mut self, nodes: Vec<Node>, links: Vec<Link>) -> GraphSnapshot {
        let prev = self.clear();
        self.load(nodes, links);
        prev
    }

    /// Removes everything and returns the previous contents.
    pub fn clear(&mut self) -> GraphSnapshot {
        self.node_index.clear();
        self.link_index.clear();
        GraphSnapshot {
            nodes: std::mem::take(&mut self.nodes),
            links: std::mem::take(&mut self.links),
        }
    }

    /// Canonical serialization (sorted by id) for hashing/comparison.
    /// Sequence order does not affect the result.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, CanonicalError> {
        #[derive(Serialize)]
        struct Canonical<'a> {
            nodes: Vec<&'a Node>,
            links: Vec<&'a Link>,
        }

        let mut nodes: Vec<&Node> = self.nodes.iter().collect();
        nodes.sort_by_key(|n| n.id);
        let mut links: Vec<&Link> = self.links.iter().collect();
        links.sort_by_key(|l| l.id);

        let mut bytes = Vec::new();
        into_writer(&Canonical { nodes, links }, &mut bytes)
            .map_err(|e| CanonicalError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// BLAKE3 hash of the canonical form.
    pub fn compute_hash(&self) -> Result<Hash32, CanonicalError> {
        let bytes = self.to_canonical_bytes()?;
        Ok(blake3::hash(&bytes).into())
    }

    fn load(&mut self, nodes: Vec<Node>, links: Vec<Link>) {
        self.nodes.reserve(nodes.len());
        self.links.reserve(links.len());
        for n in nodes {
            self.add_node(n);
        }
        for l in links {
            self.add_link(l);
        }
    }

    fn reindex_nodes_from(&mut self, start: usize) {
        for (i, n) in self.nodes.iter().enumerate().skip(start) {
            self.node_index.insert(n.id, i);
        }
    }

    fn reindex_links_from(&mut self, start: usize) {
        for (i, l) in self.links.iter().enumerate().skip(start) {
            self.link_index.insert(l.id, i);
        }
    }

    fn rebuild_node_index(&mut self) {
        self.node_index.clear();
        self.reindex_nodes_from(0);
    }

    fn rebuild_link_index(&mut self) {
        self.link_index.clear();
        self.reindex_links_from(0);
    }
}
