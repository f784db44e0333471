// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The replay log: frames of elements, where an element is either a single
//! step or a nested frame applied as one unit.
//!
//! Elements are addressed two ways. `(frame, step)` is what a viewer shows;
//! the flat index counts top-level elements across all frames and is what the
//! cursor stores. Frame start offsets are precomputed so both conversions are
//! cheap.

use std::ops::Range;

use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use crate::op::Op;

/// One top-level entry of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A single operation.
    Step(Op),
    /// Several elements applied (and undone) together.
    Frame(Vec<Element>),
}

impl Element {
    /// Decodes an element from its JSON form. Never fails; shapes that are
    /// neither a step nor a nested frame become [`Op::Malformed`].
    pub fn from_json(v: &Json) -> Self {
        let Json::Array(items) = v else {
            return Self::malformed("", format!("expected a step array, got {v}"));
        };
        match items.first() {
            None => Self::Frame(Vec::new()),
            Some(Json::Array(_)) => Self::Frame(items.iter().map(Self::from_json).collect()),
            Some(Json::String(code)) => match items.get(1) {
                None | Some(Json::Null) => Self::Step(Op::decode(code, &[])),
                Some(Json::Array(params)) => Self::Step(Op::decode(code, params)),
                Some(other) => Self::malformed(code, format!("params must be an array, got {other}")),
            },
            Some(other) => Self::malformed("", format!("expected an opcode, got {other}")),
        }
    }

    fn malformed(code: &str, reason: String) -> Self {
        Self::Step(Op::Malformed {
            code: code.to_owned(),
            reason,
        })
    }

    /// Whether this element is a nested frame.
    pub fn is_frame(&self) -> bool {
        matches!(self, Self::Frame(_))
    }

    /// Visits every operation, depth first.
    pub fn for_each_op<'a>(&'a self, f: &mut impl FnMut(&'a Op)) {
        match self {
            Self::Step(op) => f(op),
            Self::Frame(children) => {
                for child in children {
                    child.for_each_op(f);
                }
            }
        }
    }
}

impl From<Op> for Element {
    fn from(op: Op) -> Self {
        Self::Step(op)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        Json::deserialize(de).map(|v| Self::from_json(&v))
    }
}

/// A frame: the unit a viewer advances by default.
pub type Frame = Vec<Element>;

/// Immutable sequence of frames with precomputed flat offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    frames: Vec<Frame>,
    // starts[f] is the flat index of frame f's first element; the extra last
    // entry is the total element count.
    starts: Vec<usize>,
}

impl Default for Log {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Log {
    /// Builds a log and its offset table.
    pub fn new(frames: Vec<Frame>) -> Self {
        let mut starts = Vec::with_capacity(frames.len() + 1);
        let mut total = 0;
        starts.push(0);
        for frame in &frames {
            total += frame.len();
            starts.push(total);
        }
        Self { frames, starts }
    }

    /// All frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of top-level elements across all frames.
    pub fn total_steps(&self) -> usize {
        self.starts.last().copied().unwrap_or(0)
    }

    /// True when the log holds no elements at all.
    pub fn is_empty(&self) -> bool {
        self.total_steps() == 0
    }

    /// Flat indices covered by `frame`. Empty for an out-of-range frame.
    pub fn frame_range(&self, frame: usize) -> Range<usize> {
        match (self.starts.get(frame), self.starts.get(frame + 1)) {
            (Some(&start), Some(&end)) => start..end,
            _ => self.total_steps()..self.total_steps(),
        }
    }

    /// `(frame, step)` of the element at flat index `flat`.
    pub fn locate(&self, flat: usize) -> Option<(usize, usize)> {
        if flat >= self.total_steps() {
            return None;
        }
        // Last frame whose start is <= flat; skips over empty frames.
        let frame = self.starts.partition_point(|&s| s <= flat).saturating_sub(1);
        Some((frame, flat - self.starts[frame]))
    }

    /// Element at flat index `flat`, together with its frame index.
    pub fn get(&self, flat: usize) -> Option<(usize, &Element)> {
        let (frame, step) = self.locate(flat)?;
        self.frames.get(frame)?.get(step).map(|e| (frame, e))
    }

    /// Visits every operation in log order.
    pub fn for_each_op<'a>(&'a self, mut f: impl FnMut(&'a Op)) {
        for element in self.frames.iter().flatten() {
            element.for_each_op(&mut f);
        }
    }
}

impl<'de> Deserialize<'de> for Log {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        Vec::<Frame>::deserialize(de).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn log(v: &Json) -> Log {
        serde_json::from_value(v.clone()).unwrap()
    }

    #[test]
    fn flat_indices_skip_empty_frames() {
        let log = log(&json!([[], [["R", []], ["c", ["x"]]], [], [["R"]]]));
        assert_eq!(log.frame_count(), 4);
        assert_eq!(log.total_steps(), 3);
        assert_eq!(log.locate(0), Some((1, 0)));
        assert_eq!(log.locate(1), Some((1, 1)));
        assert_eq!(log.locate(2), Some((3, 0)));
        assert_eq!(log.locate(3), None);
        assert_eq!(log.frame_range(1), 0..2);
        assert_eq!(log.frame_range(2), 2..2);
        assert_eq!(log.frame_range(9), 3..3);
    }

    #[test]
    fn nested_frames_are_one_element() {
        let log = log(&json!([[["n", [1]], [["n", [2]], ["e", [5, 1, 2]]]]]));
        assert_eq!(log.total_steps(), 2);
        let (_, nested) = log.get(1).unwrap();
        assert!(nested.is_frame());
        let mut codes = Vec::new();
        log.for_each_op(|op| codes.push(op.code().to_owned()));
        assert_eq!(codes, ["n", "n", "e"]);
    }

    #[test]
    fn odd_shapes_decode_as_malformed() {
        for bad in [json!(7), json!([3, 4]), json!(["N", 5])] {
            let e = Element::from_json(&bad);
            assert!(
                matches!(e, Element::Step(Op::Malformed { .. })),
                "{bad} gave {e:?}"
            );
        }
    }
}
