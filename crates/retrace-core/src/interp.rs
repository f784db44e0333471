// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Applies operations to a [`Graph`] and, on request, computes the element
//! that undoes them.
//!
//! # Contract
//!
//! - Only `N` and `E` can miss: deleting an absent id reports
//!   [`ApplyOutcome::TargetMissing`] and leaves the graph untouched.
//! - Every other op succeeds. Setters aimed at an absent id, annotations,
//!   unknown and malformed ops mutate nothing and are their own inverse.
//! - Applying an op and then its inverse restores the graph up to sequence
//!   order (compare with [`Graph::compute_hash`]).

use retrace_graph::{Graph, GraphSnapshot, Link, Node, NodeId};
use tracing::{debug, trace, warn};

use crate::log::Element;
use crate::op::Op;

/// Result of applying one op or element.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The graph accepted the change. Carries the inverse when one was
    /// requested.
    Applied(Option<Element>),
    /// The target did not exist; nothing changed.
    TargetMissing,
}

impl ApplyOutcome {
    /// True for [`ApplyOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

fn applied(want_inverse: bool, inverse: impl FnOnce() -> Element) -> ApplyOutcome {
    ApplyOutcome::Applied(want_inverse.then(inverse))
}

fn step(op: Op) -> Element {
    Element::Step(op)
}

fn self_inverse(op: &Op, want_inverse: bool) -> ApplyOutcome {
    applied(want_inverse, || step(op.clone()))
}

fn absent(op: &Op, want_inverse: bool) -> ApplyOutcome {
    debug!(%op, "target absent; no-op");
    self_inverse(op, want_inverse)
}

/// Applies one op.
pub fn apply_op(graph: &mut Graph, op: &Op, want_inverse: bool) -> ApplyOutcome {
    trace!(%op, "apply");
    match op {
        Op::SetNodeClass { id, class } => match graph.set_node_class(*id, class.clone()) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetNodeClass {
                    id: *id,
                    class: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::SetLinkClass { id, class } => match graph.set_link_class(*id, class.clone()) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetLinkClass {
                    id: *id,
                    class: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::SetNodeValue { id, value } => match graph.set_node_value(*id, value.clone()) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetNodeValue {
                    id: *id,
                    value: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::SetLinkValue { id, value } => match graph.set_link_value(*id, value.clone()) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetLinkValue {
                    id: *id,
                    value: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::SetNodeLabel { id, label } => match graph.set_node_label(*id, label.clone()) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetNodeLabel {
                    id: *id,
                    label: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::SetLinkLabel { id, label } => match graph.set_link_label(*id, label.clone()) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetLinkLabel {
                    id: *id,
                    label: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::SetLinkDirection { id, direction } => {
            match graph.set_link_direction(*id, *direction) {
                Some(prev) => applied(want_inverse, || {
                    step(Op::SetLinkDirection {
                        id: *id,
                        direction: prev,
                    })
                }),
                None => absent(op, want_inverse),
            }
        }
        Op::ToggleLinkDirection { id } => match graph.toggle_link_direction(*id) {
            Some(prev) => applied(want_inverse, || {
                step(Op::SetLinkDirection {
                    id: *id,
                    direction: prev,
                })
            }),
            None => absent(op, want_inverse),
        },
        Op::AddNode(node) => {
            let id = node.id;
            let replaced = graph.add_node(node.clone());
            let graph = &*graph;
            applied(want_inverse, || match replaced {
                Some(prev) => step(Op::AddNode(prev)),
                None => retract_node(id, graph.incident_links(id).cloned().collect()),
            })
        }
        Op::AddLink(link) => {
            let id = link.id;
            let replaced = graph.add_link(link.clone());
            applied(want_inverse, || match replaced {
                Some(prev) => step(Op::AddLink(prev)),
                None => step(Op::DeleteLink { id }),
            })
        }
        Op::DeleteNode { id } => match graph.remove_node(*id) {
            Some(removed) => applied(want_inverse, || recreate_node(removed.node, removed.links)),
            None => {
                debug!(%op, "delete target missing");
                ApplyOutcome::TargetMissing
            }
        },
        Op::DeleteLink { id } => match graph.remove_link(*id) {
            Some(link) => applied(want_inverse, || step(Op::AddLink(link))),
            None => {
                debug!(%op, "delete target missing");
                ApplyOutcome::TargetMissing
            }
        },
        Op::Clear => {
            let prev = graph.clear();
            applied(want_inverse, || step(Op::LoadGraph(prev)))
        }
        Op::LoadGraph(GraphSnapshot { nodes, links }) => {
            let prev = graph.replace(nodes.clone(), links.clone());
            applied(want_inverse, || {
                if prev.is_empty() {
                    step(Op::Clear)
                } else {
                    step(Op::LoadGraph(prev))
                }
            })
        }
        Op::Annotation(a) => {
            debug!(code = a.code, kind = ?a.kind, "annotation");
            self_inverse(op, want_inverse)
        }
        Op::Unknown { code, .. } => {
            warn!(code = %code, "unknown opcode; ignored");
            self_inverse(op, want_inverse)
        }
        Op::Malformed { code, reason } => {
            warn!(code = %code, reason = %reason, "malformed step; ignored");
            self_inverse(op, want_inverse)
        }
    }
}

// Deleting the node cascades to links that already pointed at its id
// before it existed; those come back right after.
fn retract_node(id: NodeId, dangling: Vec<Link>) -> Element {
    if dangling.is_empty() {
        return step(Op::DeleteNode { id });
    }
    let mut group = Vec::with_capacity(dangling.len() + 1);
    group.push(step(Op::DeleteNode { id }));
    group.extend(dangling.into_iter().map(|l| step(Op::AddLink(l))));
    Element::Frame(group)
}

// The node first so the links have an endpoint again, then the links in
// their original order.
fn recreate_node(node: Node, links: Vec<Link>) -> Element {
    let mut group = Vec::with_capacity(links.len() + 1);
    group.push(step(Op::AddNode(node)));
    group.extend(links.into_iter().map(|l| step(Op::AddLink(l))));
    Element::Frame(group)
}

/// Applies a step or a nested frame.
///
/// A nested frame applies its children in order and succeeds when at least
/// one child does. Its inverse is a frame of the children's inverses in
/// reverse order, so undoing is again a front-to-back application.
pub fn apply_element(graph: &mut Graph, element: &Element, want_inverse: bool) -> ApplyOutcome {
    match element {
        Element::Step(op) => apply_op(graph, op, want_inverse),
        Element::Frame(children) => {
            let mut inverses = Vec::new();
            let mut any = false;
            for child in children {
                if let ApplyOutcome::Applied(inverse) = apply_element(graph, child, want_inverse) {
                    any = true;
                    inverses.extend(inverse);
                }
            }
            if !any {
                return ApplyOutcome::TargetMissing;
            }
            inverses.reverse();
            applied(want_inverse, || Element::Frame(inverses))
        }
    }
}
