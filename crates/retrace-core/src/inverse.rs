// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Frame-partitioned stack of inverse elements.
//!
//! ```text
//!   groups (oldest first)          entries (oldest first)
//!   ┌──────────────┐
//!   │ frame 0      │ ── [inv n1, inv n2, inv e10]
//!   ├──────────────┤
//!   │ frame 2      │ ── [inv nc1]            <- top
//!   └──────────────┘
//! ```
//!
//! # Invariants
//!
//! - Groups only ever hold entries from the log frame they are tagged with.
//! - An empty group never survives: popping its last entry removes it, and
//!   the cursor closes a group it opened but could not fill.
//! - [`InverseStack::pop_frame`] hands entries back newest first, which is
//!   the order they must be applied in.

use thiserror::Error;

use crate::log::Element;

/// Misuse of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    /// `push_step` with no group open.
    #[error("no inverse frame is open")]
    NoOpenFrame,
}

/// Inverse of one top-level log element.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    /// Flat log index of the element this entry undoes.
    pub origin: usize,
    /// Element that reverts it.
    pub inverse: Element,
}

/// All inverses recorded for one log frame.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoFrame {
    /// Log frame index.
    pub frame: usize,
    /// Inverses. Oldest first while on the stack; newest first once popped.
    pub entries: Vec<UndoEntry>,
}

/// Stack of [`UndoFrame`]s.
#[derive(Debug, Clone, Default)]
pub struct InverseStack {
    frames: Vec<UndoFrame>,
}

impl InverseStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// True when nothing can be undone.
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(|f| f.entries.is_empty())
    }

    /// Number of groups, including an open empty one.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Entries in the top group.
    pub fn steps_in_top_frame(&self) -> usize {
        self.frames.last().map_or(0, |f| f.entries.len())
    }

    /// Entries across all groups.
    pub fn total_steps(&self) -> usize {
        self.frames.iter().map(|f| f.entries.len()).sum()
    }

    /// Log frame the top group belongs to.
    pub fn top_frame(&self) -> Option<usize> {
        self.frames.last().map(|f| f.frame)
    }

    /// Starts a new group for log frame `frame`, discarding an empty top
    /// group first.
    pub fn open_frame(&mut self, frame: usize) {
        self.close_frame();
        self.frames.push(UndoFrame {
            frame,
            entries: Vec::new(),
        });
    }

    /// Opens a group for `frame` unless the top group already is one.
    pub fn ensure_frame(&mut self, frame: usize) {
        if self.top_frame() != Some(frame) {
            self.open_frame(frame);
        }
    }

    /// Drops the top group if it is empty. Returns whether one was dropped.
    pub fn close_frame(&mut self) -> bool {
        if self.frames.last().is_some_and(|f| f.entries.is_empty()) {
            self.frames.pop();
            return true;
        }
        false
    }

    /// Appends to the top group.
    pub fn push_step(&mut self, entry: UndoEntry) -> Result<(), StackError> {
        let top = self.frames.last_mut().ok_or(StackError::NoOpenFrame)?;
        top.entries.push(entry);
        Ok(())
    }

    /// Removes the newest entry. A group emptied by this is removed with it.
    pub fn pop_step(&mut self) -> Option<UndoEntry> {
        loop {
            let top = self.frames.last_mut()?;
            if let Some(entry) = top.entries.pop() {
                if top.entries.is_empty() {
                    self.frames.pop();
                }
                return Some(entry);
            }
            self.frames.pop();
        }
    }

    /// Removes the top non-empty group, entries newest first.
    pub fn pop_frame(&mut self) -> Option<UndoFrame> {
        loop {
            let mut group = self.frames.pop()?;
            if group.entries.is_empty() {
                continue;
            }
            group.entries.reverse();
            return Some(group);
        }
    }
}
