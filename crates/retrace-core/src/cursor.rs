// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bidirectional playback cursor.
//!
//! The cursor walks a [`Log`] over a [`Graph`] it borrows per call. Moving
//! forward records an inverse for every element that applied; moving back
//! pops and applies those inverses. The cursor owns both the
//! [`InverseStack`] and the [`AutoPlay`] state, so resetting one always
//! resets the others.
//!
//! # Position
//!
//! Internally the cursor is a flat index `next`: the first element not yet
//! applied. [`Position`] is derived from it: the last element passed, or
//! [`Position::BeforeStart`] when nothing has been passed.
//!
//! # Invariants
//!
//! - `step_count` equals the number of entries on the inverse stack.
//! - Every stack entry's origin is below `next`, and the graph equals the
//!   initial graph with every element in `[0, next)` applied in order.
//! - An element that fails to apply is skipped and never counted.
//! - Reaching either end pauses auto-play.

use std::time::{Duration, Instant};

use retrace_graph::Graph;
use tracing::{debug, warn};

use crate::autoplay::{Action, AutoPlay, AutoPlayConfig, PlayDirection};
use crate::interp::{apply_element, ApplyOutcome};
use crate::inverse::{InverseStack, UndoEntry};
use crate::log::{Element, Log};

/// Last element the cursor has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Nothing passed yet; shown as `(-1, -1)`.
    BeforeStart,
    /// Element `step` of frame `frame`.
    At {
        /// Frame index.
        frame: usize,
        /// Element index within the frame.
        step: usize,
    },
}

impl Position {
    /// `(frame, step)` with `-1` for [`Position::BeforeStart`].
    pub fn indices(self) -> (i64, i64) {
        match self {
            Self::BeforeStart => (-1, -1),
            Self::At { frame, step } => (to_i64(frame), to_i64(step)),
        }
    }
}

fn to_i64(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// `(step_count, max_steps)` for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Elements currently applied and undoable.
    pub step_count: usize,
    /// Top-level elements in the log.
    pub max_steps: usize,
}

/// What a navigation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Nothing was due.
    NoOp,
    /// Applied this many elements.
    Advanced(usize),
    /// Undid this many elements.
    Rewound(usize),
    /// No element left to apply. Auto-play is paused.
    ReachedEnd,
    /// Nothing left to undo. Auto-play is paused.
    ReachedStart,
}

impl StepResult {
    /// True for [`StepResult::ReachedEnd`] and [`StepResult::ReachedStart`].
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ReachedEnd | Self::ReachedStart)
    }

    /// True when the graph changed.
    pub fn moved(self) -> bool {
        matches!(self, Self::Advanced(_) | Self::Rewound(_))
    }
}

/// Cursor over one log.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    next: usize,
    step_count: usize,
    max_steps: usize,
    undo: InverseStack,
    autoplay: AutoPlay,
}

impl PlaybackCursor {
    /// Cursor at the start of `log`, paused.
    pub fn new(log: &Log, config: AutoPlayConfig) -> Self {
        Self {
            next: 0,
            step_count: 0,
            max_steps: log.total_steps(),
            undo: InverseStack::new(),
            autoplay: AutoPlay::new(config),
        }
    }

    /// Back to the start of `log`: stack cleared, paused, direction forward.
    /// The caller restores the graph.
    pub fn reset(&mut self, log: &Log) {
        self.next = 0;
        self.step_count = 0;
        self.max_steps = log.total_steps();
        self.undo.clear();
        self.autoplay.pause();
        self.autoplay.set_direction(PlayDirection::Forward);
    }

    /// Last element passed.
    pub fn position(&self, log: &Log) -> Position {
        self.next
            .checked_sub(1)
            .and_then(|last| log.locate(last))
            .map_or(Position::BeforeStart, |(frame, step)| Position::At {
                frame,
                step,
            })
    }

    /// Flat index of the next element to apply.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Whether an element remains ahead of the cursor.
    pub fn has_frame(&self) -> bool {
        self.next < self.max_steps
    }

    /// Elements applied and undoable.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Top-level elements in the log.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Both counters.
    pub fn progress(&self) -> Progress {
        Progress {
            step_count: self.step_count,
            max_steps: self.max_steps,
        }
    }

    /// Recorded inverses.
    pub fn inverse_stack(&self) -> &InverseStack {
        &self.undo
    }

    /// Auto-play state.
    pub fn autoplay(&self) -> &AutoPlay {
        &self.autoplay
    }

    /// Applies the next top-level element, skipping any that fail.
    pub fn do_step(&mut self, log: &Log, graph: &mut Graph) -> StepResult {
        while let Some((frame, element)) = log.get(self.next) {
            let origin = self.next;
            self.next += 1;
            match apply_element(graph, element, true) {
                ApplyOutcome::Applied(inverse) => {
                    self.record(frame, origin, inverse);
                    self.step_count += 1;
                    return StepResult::Advanced(1);
                }
                ApplyOutcome::TargetMissing => debug!(frame, origin, "step missed; skipping"),
            }
        }
        self.at_end()
    }

    /// Applies the rest of the current frame. A frame where nothing applies
    /// leaves no trace and the cursor moves on to the next one.
    pub fn do_frame(&mut self, log: &Log, graph: &mut Graph) -> StepResult {
        while let Some((frame, _)) = log.get(self.next) {
            let end = log.frame_range(frame).end;
            self.undo.ensure_frame(frame);
            let mut applied = 0;
            while self.next < end {
                let origin = self.next;
                self.next += 1;
                let Some((_, element)) = log.get(origin) else {
                    break;
                };
                if let ApplyOutcome::Applied(inverse) = apply_element(graph, element, true) {
                    self.record(frame, origin, inverse);
                    applied += 1;
                }
            }
            if applied > 0 {
                self.step_count += applied;
                return StepResult::Advanced(applied);
            }
            self.undo.close_frame();
            debug!(frame, "frame applied nothing; skipping");
        }
        self.at_end()
    }

    /// Undoes the most recent element.
    pub fn prev_step(&mut self, graph: &mut Graph) -> StepResult {
        let Some(entry) = self.undo.pop_step() else {
            return self.at_start();
        };
        undo(graph, &entry.inverse, entry.origin);
        self.next = entry.origin;
        self.step_count = self.step_count.saturating_sub(1);
        StepResult::Rewound(1)
    }

    /// Undoes the most recent frame group and moves to that frame's start.
    pub fn prev_frame(&mut self, log: &Log, graph: &mut Graph) -> StepResult {
        let Some(group) = self.undo.pop_frame() else {
            return self.at_start();
        };
        for entry in &group.entries {
            undo(graph, &entry.inverse, entry.origin);
        }
        let undone = group.entries.len();
        self.next = log.frame_range(group.frame).start;
        self.step_count = self.step_count.saturating_sub(undone);
        StepResult::Rewound(undone)
    }

    /// Re-applies every element before the cursor to `graph` without
    /// recording inverses. Used after the graph was rebuilt from scratch.
    /// Returns the number of elements that applied.
    pub fn replay_to_cursor(&self, log: &Log, graph: &mut Graph) -> usize {
        (0..self.next)
            .filter_map(|flat| log.get(flat))
            .filter(|(_, element)| apply_element(graph, element, false).is_applied())
            .count()
    }

    /// Starts auto-play in the current direction.
    pub fn play(&mut self, now: Instant) {
        debug!(direction = ?self.autoplay.direction(), "play");
        self.autoplay.play(now);
    }

    /// Stops auto-play.
    pub fn pause(&mut self) {
        debug!("pause");
        self.autoplay.pause();
    }

    /// Play/pause button: starts in `direction` when paused; when playing,
    /// pauses and restarts only if `direction` differs from the current one.
    pub fn toggle_play(&mut self, direction: PlayDirection, now: Instant) {
        let was_playing = self.autoplay.is_playing();
        let current = self.autoplay.direction();
        self.pause();
        if !was_playing || current != direction {
            self.autoplay.set_direction(direction);
            self.play(now);
        }
    }

    /// Sets the direction; takes effect at the next firing.
    pub fn set_direction(&mut self, direction: PlayDirection) {
        self.autoplay.set_direction(direction);
    }

    /// Changes granularity, restarting auto-play if it was running.
    pub fn set_stepwise(&mut self, stepwise: bool, now: Instant) {
        self.restarting(now, |ap| ap.set_stepwise(stepwise));
    }

    /// Changes the firing interval, restarting auto-play if it was running.
    pub fn set_speed(&mut self, speed: Duration, now: Instant) {
        self.restarting(now, |ap| ap.set_speed(speed));
    }

    /// Runs the auto-play firing if one is due.
    pub fn poll(&mut self, now: Instant, log: &Log, graph: &mut Graph) -> StepResult {
        let Some(action) = self.autoplay.take_due(now) else {
            return StepResult::NoOp;
        };
        let result = match action {
            Action::NextStep => self.do_step(log, graph),
            Action::NextFrame => self.do_frame(log, graph),
            Action::PrevStep => self.prev_step(graph),
            Action::PrevFrame => self.prev_frame(log, graph),
        };
        self.autoplay.reschedule(now);
        result
    }

    fn restarting(&mut self, now: Instant, change: impl FnOnce(&mut AutoPlay)) {
        let was_playing = self.autoplay.is_playing();
        self.autoplay.pause();
        change(&mut self.autoplay);
        if was_playing {
            self.autoplay.play(now);
        }
    }

    fn record(&mut self, frame: usize, origin: usize, inverse: Option<Element>) {
        // apply_element always returns an inverse when asked for one.
        let inverse = inverse.unwrap_or_else(|| Element::Frame(Vec::new()));
        self.undo.ensure_frame(frame);
        if let Err(err) = self.undo.push_step(UndoEntry { origin, inverse }) {
            warn!(%err, frame, origin, "inverse dropped");
        }
    }

    fn at_end(&mut self) -> StepResult {
        self.next = self.max_steps;
        self.autoplay.pause();
        StepResult::ReachedEnd
    }

    fn at_start(&mut self) -> StepResult {
        self.next = 0;
        self.step_count = 0;
        self.autoplay.pause();
        StepResult::ReachedStart
    }
}

fn undo(graph: &mut Graph, inverse: &Element, origin: usize) {
    if !apply_element(graph, inverse, false).is_applied() {
        warn!(origin, "inverse did not apply; graph may have drifted");
    }
}

#[cfg(test)]
mod tests {
    use retrace_graph::Node;

    use super::*;
    use crate::op::Op;

    fn add(id: i64) -> Element {
        Element::Step(Op::AddNode(Node::new(id)))
    }

    fn delete(id: i64) -> Element {
        Element::Step(Op::DeleteNode { id })
    }

    #[test]
    fn position_tracks_the_last_element_passed() {
        let log = Log::new(vec![vec![add(1), add(2)], vec![add(3)]]);
        let mut g = Graph::new();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        assert_eq!(c.position(&log), Position::BeforeStart);
        assert_eq!(c.position(&log).indices(), (-1, -1));
        c.do_step(&log, &mut g);
        assert_eq!(c.position(&log), Position::At { frame: 0, step: 0 });
        c.do_frame(&log, &mut g);
        assert_eq!(c.position(&log), Position::At { frame: 0, step: 1 });
        c.do_frame(&log, &mut g);
        assert_eq!(c.position(&log), Position::At { frame: 1, step: 0 });
        assert!(!c.has_frame());
    }

    #[test]
    fn failed_steps_are_skipped_and_not_counted() {
        let log = Log::new(vec![vec![delete(7), add(1), delete(8)]]);
        let mut g = Graph::new();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        assert_eq!(c.do_step(&log, &mut g), StepResult::Advanced(1));
        assert_eq!(c.next_index(), 2);
        assert_eq!(c.do_step(&log, &mut g), StepResult::ReachedEnd);
        assert_eq!(c.step_count(), 1);
        assert_eq!(c.next_index(), 3);
    }

    #[test]
    fn prev_step_lands_on_the_undone_element() {
        let log = Log::new(vec![vec![add(1), delete(9), add(2)]]);
        let mut g = Graph::new();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        c.do_frame(&log, &mut g);
        assert_eq!(c.step_count(), 2);
        assert_eq!(c.prev_step(&mut g), StepResult::Rewound(1));
        assert_eq!(c.next_index(), 2);
        assert_eq!(c.prev_step(&mut g), StepResult::Rewound(1));
        assert_eq!(c.next_index(), 0);
        assert!(g.is_empty());
        assert_eq!(c.prev_step(&mut g), StepResult::ReachedStart);
    }

    #[test]
    fn do_frame_resumes_a_partly_stepped_frame_in_the_same_group() {
        let log = Log::new(vec![vec![add(1), add(2), add(3)]]);
        let mut g = Graph::new();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        c.do_step(&log, &mut g);
        assert_eq!(c.do_frame(&log, &mut g), StepResult::Advanced(2));
        assert_eq!(c.inverse_stack().frame_count(), 1);
        assert_eq!(c.prev_frame(&log, &mut g), StepResult::Rewound(3));
        assert!(g.is_empty());
        assert_eq!(c.step_count(), 0);
    }

    #[test]
    fn terminal_results_pause_autoplay() {
        let log = Log::new(vec![vec![add(1)]]);
        let mut g = Graph::new();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        let t0 = Instant::now();
        c.play(t0);
        assert!(c.autoplay().is_playing());
        assert_eq!(c.do_frame(&log, &mut g), StepResult::Advanced(1));
        assert_eq!(c.do_frame(&log, &mut g), StepResult::ReachedEnd);
        assert!(!c.autoplay().is_playing());

        c.play(t0);
        c.set_direction(PlayDirection::Reverse);
        assert_eq!(c.prev_frame(&log, &mut g), StepResult::Rewound(1));
        assert_eq!(c.prev_frame(&log, &mut g), StepResult::ReachedStart);
        assert!(!c.autoplay().is_playing());
        assert_eq!(c.position(&log), Position::BeforeStart);
    }

    #[test]
    fn toggle_play_switches_direction_or_pauses() {
        let log = Log::default();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        let t0 = Instant::now();
        c.toggle_play(PlayDirection::Forward, t0);
        assert!(c.autoplay().is_playing());
        c.toggle_play(PlayDirection::Reverse, t0);
        assert!(c.autoplay().is_playing());
        assert!(c.autoplay().is_reverse());
        c.toggle_play(PlayDirection::Reverse, t0);
        assert!(!c.autoplay().is_playing());
    }

    #[test]
    fn speed_change_while_playing_restarts_the_schedule() {
        let log = Log::default();
        let mut c = PlaybackCursor::new(&log, AutoPlayConfig::default());
        let t0 = Instant::now();
        c.play(t0);
        let t1 = t0 + Duration::from_millis(300);
        c.set_speed(Duration::from_millis(100), t1);
        assert!(c.autoplay().is_playing());
        assert_eq!(c.autoplay().deadline(), Some(t1 + Duration::from_millis(500)));

        c.pause();
        c.set_stepwise(true, t1);
        assert!(!c.autoplay().is_playing());
        assert!(c.autoplay().is_stepwise());
    }
}
