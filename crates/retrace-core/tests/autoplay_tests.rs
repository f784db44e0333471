// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Auto-play driven by synthetic clocks through `poll`.
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::{Duration, Instant};

use common::session;
use retrace_core::{PlayDirection, Position, StepResult};
use serde_json::json;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn three_frames() -> serde_json::Value {
    json!([[["n", [1]], ["n", [2]]], [["e", [7, 1, 2]]], [["nc", [1, "x"]]]])
}

#[test]
fn forward_play_runs_to_the_end_and_pauses() {
    let mut s = session(&three_frames());
    let t0 = Instant::now();
    s.play(t0);
    assert_eq!(s.poll(t0), StepResult::NoOp);
    assert_eq!(s.next_deadline(), Some(t0 + ms(500)));

    let mut now = t0 + ms(500);
    let mut results = Vec::new();
    while let Some(deadline) = s.next_deadline() {
        now = now.max(deadline);
        results.push(s.poll(now));
    }
    assert_eq!(
        results,
        [
            StepResult::Advanced(2),
            StepResult::Advanced(1),
            StepResult::Advanced(1),
            StepResult::ReachedEnd
        ]
    );
    assert!(!s.is_playing());
    assert_eq!(s.progress().step_count, 4);
}

#[test]
fn firings_are_spaced_by_speed() {
    let mut s = session(&three_frames());
    let t0 = Instant::now();
    s.play(t0);
    let t1 = t0 + ms(500);
    assert_eq!(s.poll(t1), StepResult::Advanced(2));
    assert_eq!(s.next_deadline(), Some(t1 + ms(800)));
    assert_eq!(s.poll(t1 + ms(799)), StepResult::NoOp);
    assert_eq!(s.poll(t1 + ms(800)), StepResult::Advanced(1));
}

#[test]
fn reverse_stepwise_play_unwinds_to_the_start() {
    let mut s = session(&three_frames());
    while s.do_frame() != StepResult::ReachedEnd {}
    let t0 = Instant::now();
    s.set_stepwise(true, t0);
    s.toggle_play(PlayDirection::Reverse, t0);
    assert!(s.is_playing());
    assert!(s.is_reverse());

    let mut now = t0;
    let mut rewound = 0;
    while let Some(deadline) = s.next_deadline() {
        now = deadline;
        if let StepResult::Rewound(n) = s.poll(now) {
            rewound += n;
        }
    }
    assert_eq!(rewound, 4);
    assert!(!s.is_playing());
    assert_eq!(s.position(), Position::BeforeStart);
    assert!(s.graph().is_empty());
}

#[test]
fn pausing_before_the_deadline_cancels_the_firing() {
    let mut s = session(&three_frames());
    let t0 = Instant::now();
    s.play(t0);
    s.pause();
    assert_eq!(s.next_deadline(), None);
    assert_eq!(s.poll(t0 + ms(10_000)), StepResult::NoOp);
    assert_eq!(s.progress().step_count, 0);
}

#[test]
fn reset_stops_playback_and_clears_reverse() {
    let mut s = session(&three_frames());
    let t0 = Instant::now();
    s.do_frame();
    s.toggle_play(PlayDirection::Reverse, t0);
    s.reset(None);
    assert!(!s.is_playing());
    assert!(!s.is_reverse());
    assert_eq!(s.progress().step_count, 0);
    assert!(s.graph().is_empty());
}
