// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One open run: metadata, log, live graph and cursor in a single owner.

use std::time::{Duration, Instant};

use retrace_graph::{Graph, GraphSnapshot, Link, Node};
use serde_json::Value as Json;
use tracing::info;

use crate::autoplay::{AutoPlayConfig, PlayDirection};
use crate::cursor::{PlaybackCursor, Position, Progress, StepResult};
use crate::log::Log;
use crate::run::{RunFile, RunMeta};

/// A run being replayed.
#[derive(Debug, Clone)]
pub struct ReplaySession {
    meta: RunMeta,
    settings: Option<Json>,
    initial: GraphSnapshot,
    log: Log,
    graph: Graph,
    cursor: PlaybackCursor,
}

impl ReplaySession {
    /// Opens `run` at its start, paused.
    pub fn new(run: RunFile, config: AutoPlayConfig) -> Self {
        let RunFile {
            meta,
            graph,
            frames,
            settings,
        } = run;
        let cursor = PlaybackCursor::new(&frames, config);
        let session = Self {
            meta,
            settings,
            graph: Graph::from(graph.clone()),
            initial: graph,
            log: frames,
            cursor,
        };
        info!(
            run = session.name().unwrap_or("-"),
            frames = session.log.frame_count(),
            steps = session.log.total_steps(),
            nodes = session.graph.nodes().len(),
            links = session.graph.links().len(),
            "session opened"
        );
        session
    }

    /// Run name (`meta.filename`).
    pub fn name(&self) -> Option<&str> {
        self.meta.filename.as_deref()
    }

    /// Run title.
    pub fn title(&self) -> Option<&str> {
        self.meta.title.as_deref()
    }

    /// Full metadata.
    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    /// Viewer settings carried by the run.
    pub fn settings(&self) -> Option<&Json> {
        self.settings.as_ref()
    }

    /// The log.
    pub fn log(&self) -> &Log {
        &self.log
    }

    /// The live graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Live nodes.
    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    /// Live links.
    pub fn links(&self) -> &[Link] {
        self.graph.links()
    }

    /// The cursor.
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// Last element passed.
    pub fn position(&self) -> Position {
        self.cursor.position(&self.log)
    }

    /// `(step_count, max_steps)`.
    pub fn progress(&self) -> Progress {
        self.cursor.progress()
    }

    /// Whether an element remains ahead of the cursor.
    pub fn has_frame(&self) -> bool {
        self.cursor.has_frame()
    }

    /// Whether auto-play is running.
    pub fn is_playing(&self) -> bool {
        self.cursor.autoplay().is_playing()
    }

    /// Whether auto-play moves backwards.
    pub fn is_reverse(&self) -> bool {
        self.cursor.autoplay().is_reverse()
    }

    /// Whether auto-play moves by step.
    pub fn is_stepwise(&self) -> bool {
        self.cursor.autoplay().is_stepwise()
    }

    /// Auto-play interval.
    pub fn speed(&self) -> Duration {
        self.cursor.autoplay().speed()
    }

    /// Next element forward.
    pub fn do_step(&mut self) -> StepResult {
        self.cursor.do_step(&self.log, &mut self.graph)
    }

    /// Rest of the current frame forward.
    pub fn do_frame(&mut self) -> StepResult {
        self.cursor.do_frame(&self.log, &mut self.graph)
    }

    /// One element back.
    pub fn prev_step(&mut self) -> StepResult {
        self.cursor.prev_step(&mut self.graph)
    }

    /// One frame back.
    pub fn prev_frame(&mut self) -> StepResult {
        self.cursor.prev_frame(&self.log, &mut self.graph)
    }

    /// Starts auto-play.
    pub fn play(&mut self, now: Instant) {
        self.cursor.play(now);
    }

    /// Stops auto-play.
    pub fn pause(&mut self) {
        self.cursor.pause();
    }

    /// Play/pause in `direction`.
    pub fn toggle_play(&mut self, direction: PlayDirection, now: Instant) {
        self.cursor.toggle_play(direction, now);
    }

    /// Sets the auto-play direction.
    pub fn set_direction(&mut self, direction: PlayDirection) {
        self.cursor.set_direction(direction);
    }

    /// Switches between step and frame auto-play.
    pub fn set_stepwise(&mut self, stepwise: bool, now: Instant) {
        self.cursor.set_stepwise(stepwise, now);
    }

    /// Changes the auto-play interval.
    pub fn set_speed(&mut self, speed: Duration, now: Instant) {
        self.cursor.set_speed(speed, now);
    }

    /// When the host should poll next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.cursor.autoplay().deadline()
    }

    /// Runs a due auto-play firing.
    pub fn poll(&mut self, now: Instant) -> StepResult {
        self.cursor.poll(now, &self.log, &mut self.graph)
    }

    /// Back to the start with `snapshot` as the graph (the run's own
    /// starting graph when `None`).
    pub fn reset(&mut self, snapshot: Option<GraphSnapshot>) {
        if let Some(snapshot) = snapshot {
            self.initial = snapshot;
        }
        self.graph = Graph::from(self.initial.clone());
        self.cursor.reset(&self.log);
        info!(run = self.name().unwrap_or("-"), "session reset");
    }

    /// Swaps in a freshly laid out `snapshot` and silently re-applies every
    /// element before the cursor, so the view keeps its place. The inverse
    /// stack is left untouched.
    pub fn relayout(&mut self, snapshot: GraphSnapshot) -> usize {
        self.initial = snapshot;
        self.graph = Graph::from(self.initial.clone());
        let applied = self.cursor.replay_to_cursor(&self.log, &mut self.graph);
        info!(
            run = self.name().unwrap_or("-"),
            replayed = applied,
            "session relaid out"
        );
        applied
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn session() -> ReplaySession {
        let run = RunFile::from_slice(
            br#"{ "meta": { "filename": "demo" },
                  "graph": { "nodes": [{ "id": 1 }], "links": [] },
                  "frames": [[["n", [2]], ["e", [10, 1, 2]]], [["nc", [1, "hot"]]]] }"#,
        )
        .unwrap();
        ReplaySession::new(run, AutoPlayConfig::default())
    }

    #[test]
    fn reset_restores_the_starting_graph() {
        let mut s = session();
        let start = s.graph().compute_hash().unwrap();
        s.do_frame();
        s.do_frame();
        assert_eq!(s.progress().step_count, 3);
        s.reset(None);
        assert_eq!(s.graph().compute_hash().unwrap(), start);
        assert_eq!(s.progress().step_count, 0);
        assert!(s.cursor().inverse_stack().is_empty());
        assert_eq!(s.position(), Position::BeforeStart);
    }

    #[test]
    fn relayout_keeps_state_and_undo_history() {
        let mut s = session();
        s.do_frame();
        s.do_step();
        let here = s.graph().compute_hash().unwrap();
        let replayed = s.relayout(GraphSnapshot {
            nodes: vec![Node::new(1)],
            links: vec![],
        });
        assert_eq!(replayed, 3);
        assert_eq!(s.graph().compute_hash().unwrap(), here);
        assert_eq!(s.progress().step_count, 3);
        s.prev_frame();
        s.prev_frame();
        assert_eq!(s.nodes().len(), 1);
        assert!(s.links().is_empty());
    }

    #[test]
    fn name_comes_from_meta() {
        assert_eq!(session().name(), Some("demo"));
    }
}
