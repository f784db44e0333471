// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless auto-play on a current-thread runtime.
//!
//! The session only stores its next deadline; this loop sleeps until it,
//! polls, and prints what moved. Ctrl-C pauses and ends the loop.

use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use retrace_core::{PlayDirection, ReplaySession, StepResult};
use tokio::time::{sleep_until, Instant as TokioInstant};
use tracing::info;

/// How the run is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Start to end.
    Forward,
    /// End to start (fast-forwarded to the end first).
    Reverse,
    /// Start to end, then back to the start.
    Bounce,
}

pub fn run(out: &mut impl Write, mut session: ReplaySession, mode: Mode) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(play(out, &mut session, mode))
}

async fn play(out: &mut impl Write, session: &mut ReplaySession, mode: Mode) -> Result<()> {
    let mut direction = PlayDirection::Forward;
    if mode == Mode::Reverse {
        while session.do_frame() != StepResult::ReachedEnd {}
        direction = PlayDirection::Reverse;
    }
    info!(
        run = session.name().unwrap_or("-"),
        ?direction,
        stepwise = session.is_stepwise(),
        speed = ?session.speed(),
        "playing"
    );
    session.toggle_play(direction, Instant::now());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last = StepResult::NoOp;
    loop {
        let Some(deadline) = session.next_deadline() else {
            if mode == Mode::Bounce && last == StepResult::ReachedEnd {
                session.toggle_play(PlayDirection::Reverse, Instant::now());
                last = StepResult::NoOp;
                continue;
            }
            break;
        };
        tokio::select! {
            () = sleep_until(TokioInstant::from_std(deadline)) => {
                last = session.poll(Instant::now());
                if last.moved() {
                    progress_line(out, session, last)?;
                }
            }
            res = &mut ctrl_c => {
                res?;
                session.pause();
                info!("interrupted; paused");
                break;
            }
        }
    }

    let p = session.progress();
    let (frame, step) = session.position().indices();
    writeln!(
        out,
        "stopped at frame {frame} step {step} ({}/{})",
        p.step_count, p.max_steps
    )?;
    Ok(())
}

fn progress_line(out: &mut impl Write, session: &ReplaySession, result: StepResult) -> Result<()> {
    let p = session.progress();
    let (frame, step) = session.position().indices();
    let arrow = match result {
        StepResult::Rewound(_) => "<",
        _ => ">",
    };
    writeln!(
        out,
        "{arrow} [{:>4}/{}] frame {frame} step {step}  nodes={} links={}",
        p.step_count,
        p.max_steps,
        session.nodes().len(),
        session.links().len()
    )?;
    Ok(())
}
