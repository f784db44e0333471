// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `retrace verify`: walk a run to the end and back, by frame and by step,
//! and check that every boundary reached more than once shows the same
//! canonical graph hash.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use retrace_core::{ReplaySession, StepResult};
use retrace_graph::Hash32;
use tracing::{debug, warn};

/// Outcome of one verification.
#[derive(Debug, Default)]
pub struct Report {
    /// Frame boundaries checked.
    pub frames: usize,
    /// Elements that applied on the way forward.
    pub applied: usize,
    /// Top-level elements in the log.
    pub max_steps: usize,
    /// Hash at the start.
    pub start: Hash32,
    /// Hash at the end.
    pub end: Hash32,
    /// Human-readable description of each disagreement.
    pub mismatches: Vec<String>,
}

pub fn verify(session: &mut ReplaySession) -> Result<Report> {
    session.reset(None);
    let start = session.graph().compute_hash()?;
    // Hash after every frame boundary, keyed by the cursor's flat index.
    let mut seen: BTreeMap<usize, Hash32> = BTreeMap::from([(0, start)]);
    let mut report = Report {
        start,
        max_steps: session.progress().max_steps,
        ..Report::default()
    };

    while let StepResult::Advanced(_) = session.do_frame() {
        seen.insert(session.cursor().next_index(), session.graph().compute_hash()?);
        report.frames += 1;
    }
    report.applied = session.progress().step_count;
    report.end = session.graph().compute_hash()?;

    // Skipped frames change nothing, so the latest boundary at or before the
    // landing point must match.
    while let StepResult::Rewound(_) = session.prev_frame() {
        let at = session.cursor().next_index();
        let expected = seen.range(..=at).next_back().map(|(_, h)| *h);
        check(session, &mut report, "frame back", at, expected)?;
    }
    check(session, &mut report, "frame back", 0, Some(start))?;
    if session.progress().step_count != 0 {
        report
            .mismatches
            .push(format!("step count {} after full rewind", session.progress().step_count));
    }

    while let StepResult::Advanced(_) = session.do_step() {
        let at = session.cursor().next_index();
        let expected = seen.get(&at).copied();
        check(session, &mut report, "step forward", at, expected)?;
    }
    let (max_steps, end) = (report.max_steps, report.end);
    check(session, &mut report, "step forward", max_steps, Some(end))?;
    if session.progress().step_count != report.applied {
        report.mismatches.push(format!(
            "stepwise applied {} elements, framewise {}",
            session.progress().step_count,
            report.applied
        ));
    }

    while let StepResult::Rewound(_) = session.prev_step() {
        let at = session.cursor().next_index();
        let expected = seen.get(&at).copied();
        check(session, &mut report, "step back", at, expected)?;
    }
    check(session, &mut report, "step back", 0, Some(start))?;

    Ok(report)
}

fn check(
    session: &ReplaySession,
    report: &mut Report,
    pass: &str,
    at: usize,
    expected: Option<Hash32>,
) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = session.graph().compute_hash()?;
    if actual == expected {
        debug!(pass, at, "boundary ok");
    } else {
        warn!(pass, at, "boundary hash mismatch");
        report.mismatches.push(format!(
            "{pass} at element {at}: expected {} got {}",
            hex::encode(expected),
            hex::encode(actual)
        ));
    }
    Ok(())
}

pub fn print(out: &mut impl Write, report: &Report) -> Result<()> {
    writeln!(out, "start {}", hex::encode(report.start))?;
    writeln!(out, "end   {}", hex::encode(report.end))?;
    writeln!(
        out,
        "{} frames, {}/{} elements applied",
        report.frames, report.applied, report.max_steps
    )?;
    for m in &report.mismatches {
        writeln!(out, "MISMATCH {m}")?;
    }
    if report.mismatches.is_empty() {
        writeln!(out, "OK: every boundary restores the same graph")?;
    }
    Ok(())
}
