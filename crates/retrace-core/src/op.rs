// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Opcodes recorded in a run log.
//!
//! A step arrives as `["<code>", [params...]]`. Decoding never fails: codes
//! that are not recognised become [`Op::Unknown`] and parameter lists that do
//! not fit their opcode become [`Op::Malformed`]. Both replay as no-ops so a
//! single bad step cannot stall a run.

use std::fmt;

use retrace_graph::{
    normalize_class, Direction, GraphSnapshot, Link, LinkId, Node, NodeId, Value, DEFAULT_LABEL,
};
use serde_json::Value as Json;

/// What an annotation step is about. Annotations never touch the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// Free text narration (`c`, `cs`, `ch`).
    Comment,
    /// Partial or final solution reports (`s`, `S`).
    Solution,
    /// Per-node attribute panels (`na`, `nae`, `nan`, `nas`, `nA`).
    NodeInfo,
    /// Per-link attribute panels (`ea`, `eae`, `ean`, `eas`, `eA`).
    LinkInfo,
}

const ANNOTATIONS: [(&str, AnnotationKind); 15] = [
    ("c", AnnotationKind::Comment),
    ("cs", AnnotationKind::Comment),
    ("ch", AnnotationKind::Comment),
    ("s", AnnotationKind::Solution),
    ("S", AnnotationKind::Solution),
    ("na", AnnotationKind::NodeInfo),
    ("nae", AnnotationKind::NodeInfo),
    ("nan", AnnotationKind::NodeInfo),
    ("nas", AnnotationKind::NodeInfo),
    ("nA", AnnotationKind::NodeInfo),
    ("ea", AnnotationKind::LinkInfo),
    ("eae", AnnotationKind::LinkInfo),
    ("ean", AnnotationKind::LinkInfo),
    ("eas", AnnotationKind::LinkInfo),
    ("eA", AnnotationKind::LinkInfo),
];

/// Looks up an annotation opcode.
pub fn annotation_kind(code: &str) -> Option<(&'static str, AnnotationKind)> {
    ANNOTATIONS.iter().copied().find(|(c, _)| *c == code)
}

/// An annotation step: carried through replay for display layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Opcode as recorded.
    pub code: &'static str,
    /// Category of the opcode.
    pub kind: AnnotationKind,
    /// Raw parameters (free text, ids, attribute tables).
    pub params: Vec<Json>,
}

/// One decoded log step.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `nc`: set or clear a node's style class.
    SetNodeClass {
        /// Target node.
        id: NodeId,
        /// New class; `None` clears it.
        class: Option<String>,
    },
    /// `ec`: set or clear a link's style class.
    SetLinkClass {
        /// Target link.
        id: LinkId,
        /// New class; `None` clears it.
        class: Option<String>,
    },
    /// `nw`: set a node's weight.
    SetNodeValue {
        /// Target node.
        id: NodeId,
        /// New weight.
        value: Value,
    },
    /// `ew`: set a link's weight.
    SetLinkValue {
        /// Target link.
        id: LinkId,
        /// New weight.
        value: Value,
    },
    /// `n`: add a node (replacing one with the same id).
    AddNode(Node),
    /// `e`: add a link (replacing one with the same id).
    AddLink(Link),
    /// `N`: delete a node and every incident link.
    DeleteNode {
        /// Target node.
        id: NodeId,
    },
    /// `E`: delete a link.
    DeleteLink {
        /// Target link.
        id: LinkId,
    },
    /// `R`: remove everything.
    Clear,
    /// `G`: replace the whole graph.
    LoadGraph(GraphSnapshot),
    /// `nl`: set a node's label.
    SetNodeLabel {
        /// Target node.
        id: NodeId,
        /// New label.
        label: String,
    },
    /// `el`: set a link's label.
    SetLinkLabel {
        /// Target link.
        id: LinkId,
        /// New label.
        label: String,
    },
    /// `ed`: set a link's arrow orientation.
    SetLinkDirection {
        /// Target link.
        id: LinkId,
        /// New orientation.
        direction: Direction,
    },
    /// `et`: flip a link's arrow orientation.
    ToggleLinkDirection {
        /// Target link.
        id: LinkId,
    },
    /// Narration and attribute panels; never mutates the graph.
    Annotation(Annotation),
    /// An opcode this build does not know.
    Unknown {
        /// Opcode as recorded.
        code: String,
        /// Raw parameters.
        params: Vec<Json>,
    },
    /// A known opcode (or step shape) whose parameters could not be decoded.
    Malformed {
        /// Opcode as recorded; empty when the step had none.
        code: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl Op {
    /// Decodes one step. Never fails.
    pub fn decode(code: &str, params: &[Json]) -> Self {
        if let Some((code, kind)) = annotation_kind(code) {
            return Self::Annotation(Annotation {
                code,
                kind,
                params: params.to_vec(),
            });
        }
        let p = Params(params);
        let decoded = match code {
            "nc" => p.id(0).map(|id| Self::SetNodeClass {
                id,
                class: p.class(1),
            }),
            "ec" => p.id(0).map(|id| Self::SetLinkClass {
                id,
                class: p.class(1),
            }),
            "nw" => p.id(0).and_then(|id| {
                Ok(Self::SetNodeValue {
                    id,
                    value: p.value(1)?.unwrap_or_default(),
                })
            }),
            "ew" => p.id(0).and_then(|id| {
                Ok(Self::SetLinkValue {
                    id,
                    value: p.value(1)?.unwrap_or_default(),
                })
            }),
            "n" => p.node().map(Self::AddNode),
            "e" => p.link().map(Self::AddLink),
            "N" => p.id(0).map(|id| Self::DeleteNode { id }),
            "E" => p.id(0).map(|id| Self::DeleteLink { id }),
            "R" => Ok(Self::Clear),
            "G" => p.snapshot().map(Self::LoadGraph),
            "nl" => p.id(0).and_then(|id| {
                Ok(Self::SetNodeLabel {
                    id,
                    label: p.label(1)?,
                })
            }),
            "el" => p.id(0).and_then(|id| {
                Ok(Self::SetLinkLabel {
                    id,
                    label: p.label(1)?,
                })
            }),
            "ed" => p.id(0).and_then(|id| {
                Ok(Self::SetLinkDirection {
                    id,
                    direction: p.direction(1)?,
                })
            }),
            "et" => p.id(0).map(|id| Self::ToggleLinkDirection { id }),
            other => Ok(Self::Unknown {
                code: other.to_owned(),
                params: params.to_vec(),
            }),
        };
        decoded.unwrap_or_else(|reason| Self::Malformed {
            code: code.to_owned(),
            reason,
        })
    }

    /// Opcode string as it appears in a run file.
    pub fn code(&self) -> &str {
        match self {
            Self::SetNodeClass { .. } => "nc",
            Self::SetLinkClass { .. } => "ec",
            Self::SetNodeValue { .. } => "nw",
            Self::SetLinkValue { .. } => "ew",
            Self::AddNode(_) => "n",
            Self::AddLink(_) => "e",
            Self::DeleteNode { .. } => "N",
            Self::DeleteLink { .. } => "E",
            Self::Clear => "R",
            Self::LoadGraph(_) => "G",
            Self::SetNodeLabel { .. } => "nl",
            Self::SetLinkLabel { .. } => "el",
            Self::SetLinkDirection { .. } => "ed",
            Self::ToggleLinkDirection { .. } => "et",
            Self::Annotation(a) => a.code,
            Self::Unknown { code, .. } | Self::Malformed { code, .. } => code,
        }
    }

    /// True for steps that can never mutate the graph.
    pub fn is_inert(&self) -> bool {
        matches!(
            self,
            Self::Annotation(_) | Self::Unknown { .. } | Self::Malformed { .. }
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetNodeClass { id, .. }
            | Self::SetNodeValue { id, .. }
            | Self::DeleteNode { id }
            | Self::SetNodeLabel { id, .. } => write!(f, "{} node {id}", self.code()),
            Self::SetLinkClass { id, .. }
            | Self::SetLinkValue { id, .. }
            | Self::DeleteLink { id }
            | Self::SetLinkLabel { id, .. }
            | Self::SetLinkDirection { id, .. }
            | Self::ToggleLinkDirection { id } => write!(f, "{} link {id}", self.code()),
            Self::AddNode(n) => write!(f, "n node {}", n.id),
            Self::AddLink(l) => write!(f, "e link {} ({} -> {})", l.id, l.source, l.target),
            Self::LoadGraph(s) => write!(f, "G ({} nodes, {} links)", s.nodes.len(), s.links.len()),
            Self::Malformed { code, reason } => write!(f, "malformed {code:?}: {reason}"),
            _ => f.write_str(self.code()),
        }
    }
}

struct Params<'a>(&'a [Json]);

impl Params<'_> {
    fn present(&self, i: usize) -> Option<&Json> {
        self.0.get(i).filter(|v| !v.is_null())
    }

    fn id(&self, i: usize) -> Result<i64, String> {
        let v = self
            .present(i)
            .ok_or_else(|| format!("missing id parameter {i}"))?;
        as_integer(v).ok_or_else(|| format!("parameter {i}: expected an integer id, got {v}"))
    }

    fn class(&self, i: usize) -> Option<String> {
        let class = match self.present(i)? {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        };
        normalize_class(Some(class))
    }

    fn value(&self, i: usize) -> Result<Option<Value>, String> {
        self.present(i)
            .map(|v| {
                serde_json::from_value::<Value>(v.clone())
                    .map_err(|err| format!("parameter {i}: bad value: {err}"))
            })
            .transpose()
    }

    fn label(&self, i: usize) -> Result<String, String> {
        match self.present(i) {
            None => Ok(DEFAULT_LABEL.to_owned()),
            Some(Json::String(s)) => Ok(s.clone()),
            Some(v @ (Json::Number(_) | Json::Bool(_))) => Ok(v.to_string()),
            Some(v) => Err(format!("parameter {i}: expected a label, got {v}")),
        }
    }

    fn direction(&self, i: usize) -> Result<Direction, String> {
        let Some(v) = self.present(i) else {
            return Ok(Direction::Forward);
        };
        let raw = as_integer(v)
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| format!("parameter {i}: expected 0 or 1, got {v}"))?;
        Direction::try_from(raw).map_err(|err| format!("parameter {i}: {err}"))
    }

    fn node(&self) -> Result<Node, String> {
        let mut node = Node::new(self.id(0)?);
        if let Some(value) = self.value(1)? {
            node.value = value;
        }
        node.label = self.label(2)?;
        node.style_class = self.class(3);
        Ok(node)
    }

    fn link(&self) -> Result<Link, String> {
        let mut link = Link::new(self.id(0)?, self.id(1)?, self.id(2)?);
        if let Some(value) = self.value(3)?.filter(|v| !v.is_empty_vector()) {
            link.value = value;
        }
        link.direction = self.direction(4)?;
        link.label = self.label(5)?;
        link.style_class = self.class(6);
        Ok(link)
    }

    fn snapshot(&self) -> Result<GraphSnapshot, String> {
        let nodes = match self.present(0) {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|err| format!("bad node list: {err}"))?,
            None => Vec::new(),
        };
        let links = match self.present(1) {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|err| format!("bad link list: {err}"))?,
            None => Vec::new(),
        };
        Ok(GraphSnapshot { nodes, links })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn as_integer(v: &Json) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    // Ids written by JS tooling sometimes arrive as `3.0`.
    let f = v.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    fn decode(step: &Json) -> Op {
        let code = step[0].as_str().unwrap();
        let params = step[1].as_array().cloned().unwrap_or_default();
        Op::decode(code, &params)
    }

    #[test]
    fn add_link_applies_defaults() {
        let op = decode(&json!(["e", [10, 1, 2]]));
        let Op::AddLink(link) = op else {
            panic!("expected AddLink, got {op:?}");
        };
        assert_eq!(link.value, Value::Scalar(1.0));
        assert_eq!(link.direction, Direction::Forward);
        assert_eq!(link.label, DEFAULT_LABEL);
        assert_eq!(link.style_class, None);
    }

    #[test]
    fn add_link_with_empty_vector_gets_unit_weight() {
        let Op::AddLink(link) = decode(&json!(["e", [10, 1, 2, [], 1, "x", "tree"]])) else {
            panic!("expected AddLink");
        };
        assert_eq!(link.value, Value::Scalar(1.0));
        assert_eq!(link.direction, Direction::Reversed);
        assert_eq!(link.style_class.as_deref(), Some("tree"));
    }

    #[test]
    fn class_with_one_param_or_empty_string_clears() {
        assert_eq!(
            decode(&json!(["nc", [4]])),
            Op::SetNodeClass { id: 4, class: None }
        );
        assert_eq!(
            decode(&json!(["nc", [4, ""]])),
            Op::SetNodeClass { id: 4, class: None }
        );
        assert_eq!(
            decode(&json!(["ec", [4, "path"]])),
            Op::SetLinkClass {
                id: 4,
                class: Some("path".into())
            }
        );
    }

    #[test]
    fn every_annotation_code_decodes_as_annotation() {
        for (code, kind) in ANNOTATIONS {
            let op = Op::decode(code, &[json!("text")]);
            assert!(
                matches!(&op, Op::Annotation(a) if a.kind == kind && a.code == code),
                "{code} decoded as {op:?}"
            );
            assert!(op.is_inert());
        }
    }

    #[test]
    fn unknown_and_malformed_are_preserved() {
        assert!(matches!(decode(&json!(["zz", [1]])), Op::Unknown { code, .. } if code == "zz"));
        assert!(matches!(decode(&json!(["N", ["one"]])), Op::Malformed { code, .. } if code == "N"));
        assert!(matches!(decode(&json!(["ed", [3, 7]])), Op::Malformed { .. }));
        assert!(matches!(decode(&json!(["e", [1, 2]])), Op::Malformed { .. }));
    }

    #[test]
    fn float_ids_with_no_fraction_are_accepted() {
        assert_eq!(decode(&json!(["N", [3.0]])), Op::DeleteNode { id: 3 });
        assert!(matches!(decode(&json!(["N", [3.5]])), Op::Malformed { .. }));
    }

    #[test]
    fn load_graph_reads_both_lists() {
        let op = decode(&json!(["G", [[{"id": 1}], [{"id": 5, "source": 1, "target": 1}]]]));
        let Op::LoadGraph(snap) = op else {
            panic!("expected LoadGraph");
        };
        assert_eq!(snap.nodes.len(), 1);
        assert_eq!(snap.links.len(), 1);
        assert_eq!(decode(&json!(["G", []])), Op::LoadGraph(GraphSnapshot::default()));
    }
}
