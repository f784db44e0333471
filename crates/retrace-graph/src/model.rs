// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node and link records in the shape run files carry them.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Node identifier as recorded in the log.
pub type NodeId = i64;
/// Link identifier as recorded in the log.
pub type LinkId = i64;

/// Label given to nodes and links that were added without one.
pub const DEFAULT_LABEL: &str = "no label";

/// Weight carried by a node or link: one number or a vector of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Single weight.
    Scalar(f64),
    /// Multi-component weight (e.g. flow per commodity).
    Vector(Vec<f64>),
}

impl Default for Value {
    fn default() -> Self {
        Self::Scalar(1.0)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::Vector(v)
    }
}

impl Value {
    /// Scalar reduction used by display layers: the sum of all components,
    /// never below 1 (a link of width 0 would vanish).
    pub fn magnitude(&self) -> f64 {
        let sum = match self {
            Self::Scalar(v) => *v,
            Self::Vector(vs) => vs.iter().sum(),
        };
        sum.max(1.0)
    }

    /// True for a vector value with no components.
    pub fn is_empty_vector(&self) -> bool {
        matches!(self, Self::Vector(vs) if vs.is_empty())
    }
}

/// Arrow orientation of a link. Purely a rendering hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    /// `0`: drawn from source to target (or undirected).
    #[default]
    Forward,
    /// `1`: arrow drawn reversed.
    Reversed,
}

/// A direction flag outside `0 | 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid link direction {0} (expected 0 or 1)")]
pub struct InvalidDirection(pub u8);

impl Direction {
    /// `1 - self`.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Forward => Self::Reversed,
            Self::Reversed => Self::Forward,
        }
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Forward => 0,
            Direction::Reversed => 1,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = InvalidDirection;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Forward),
            1 => Ok(Self::Reversed),
            other => Err(InvalidDirection(other)),
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node id.
    pub id: NodeId,
    /// Node weight.
    #[serde(default)]
    pub value: Value,
    /// Display label.
    #[serde(default = "default_label")]
    pub label: String,
    /// Style class name (without the `-node` selector suffix).
    #[serde(
        default,
        rename = "styleClass",
        deserialize_with = "non_empty_class",
        skip_serializing_if = "Option::is_none"
    )]
    pub style_class: Option<String>,
}

impl Node {
    /// Node with a default weight of 1, the default label and no class.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            value: Value::default(),
            label: DEFAULT_LABEL.to_owned(),
            style_class: None,
        }
    }

    /// Replace the weight.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Replace the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the style class; an empty name clears it.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.style_class = normalize_class(Some(class.into()));
        self
    }

    /// Selector name a stylesheet uses for this node (`"<class>-node"`).
    pub fn css_class(&self) -> Option<String> {
        self.style_class.as_ref().map(|c| format!("{c}-node"))
    }
}

/// A graph link (edge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique link id.
    pub id: LinkId,
    /// Source node id. Not required to exist.
    pub source: NodeId,
    /// Target node id. Not required to exist.
    pub target: NodeId,
    /// Link weight.
    #[serde(default)]
    pub value: Value,
    /// Arrow orientation.
    #[serde(default)]
    pub direction: Direction,
    /// Display label.
    #[serde(default = "default_label")]
    pub label: String,
    /// Style class name (without the `-link` selector suffix).
    #[serde(
        default,
        rename = "styleClass",
        deserialize_with = "non_empty_class",
        skip_serializing_if = "Option::is_none"
    )]
    pub style_class: Option<String>,
}

impl Link {
    /// Forward link with weight 1, the default label and no class.
    pub fn new(id: LinkId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            value: Value::default(),
            direction: Direction::Forward,
            label: DEFAULT_LABEL.to_owned(),
            style_class: None,
        }
    }

    /// Replace the weight.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Replace the arrow orientation.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Replace the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the style class; an empty name clears it.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.style_class = normalize_class(Some(class.into()));
        self
    }

    /// Whether `node` is either endpoint.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// Selector name a stylesheet uses for this link (`"<class>-link"`).
    pub fn css_class(&self) -> Option<String> {
        self.style_class.as_ref().map(|c| format!("{c}-link"))
    }
}

/// Collapses `Some("")` to `None`; the log uses an empty string for "no class".
pub fn normalize_class(class: Option<String>) -> Option<String> {
    class.filter(|c| !c.is_empty())
}

fn default_label() -> String {
    DEFAULT_LABEL.to_owned()
}

fn non_empty_class<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(normalize_class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_sums_vectors_and_floors_at_one() {
        assert!((Value::Scalar(5.0).magnitude() - 5.0).abs() < f64::EPSILON);
        assert!((Value::Scalar(0.0).magnitude() - 1.0).abs() < f64::EPSILON);
        assert!((Value::Vector(vec![2.0, 3.5]).magnitude() - 5.5).abs() < f64::EPSILON);
        assert!((Value::Vector(vec![]).magnitude() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn direction_round_trips_through_u8() {
        assert_eq!(Direction::try_from(0u8), Ok(Direction::Forward));
        assert_eq!(Direction::try_from(1u8), Ok(Direction::Reversed));
        assert_eq!(Direction::try_from(2u8), Err(InvalidDirection(2)));
        assert_eq!(Direction::Forward.toggled(), Direction::Reversed);
        assert_eq!(u8::from(Direction::Reversed.toggled()), 0);
    }

    #[test]
    fn empty_class_is_no_class() {
        let n = Node::new(1).with_class("");
        assert_eq!(n.style_class, None);
        assert_eq!(n.css_class(), None);
        let n = n.with_class("visited");
        assert_eq!(n.css_class().as_deref(), Some("visited-node"));
        let l = Link::new(1, 1, 2).with_class("tree");
        assert_eq!(l.css_class().as_deref(), Some("tree-link"));
    }
}
