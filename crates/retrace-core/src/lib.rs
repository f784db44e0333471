// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! retrace-core: replay of recorded graph-algorithm runs.
//!
//! A run is a starting graph plus a log of frames. Each frame holds steps
//! (single operations) and nested frames applied as one unit. The cursor
//! walks the log in either direction: going forward it computes the inverse
//! of every element it applies, going back it applies those inverses. A step
//! that cannot apply (a delete whose target is gone) is skipped, so replay
//! survives logs that drifted from the graph they were recorded against.
//!
//! # Layers
//!
//! - [`op`] and [`log`] decode the log. Decoding never fails.
//! - [`interp`] applies ops and computes inverses.
//! - [`inverse`] stores inverses grouped by log frame.
//! - [`cursor`] and [`autoplay`] navigate and schedule.
//! - [`session`] ties one run's graph, log and cursor together.
//! - [`run`] reads run files and lists run directories.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

pub mod autoplay;
pub mod cursor;
pub mod interp;
pub mod inverse;
pub mod log;
pub mod op;
pub mod run;
pub mod session;

pub use autoplay::{
    Action, AutoPlay, AutoPlayConfig, PlayDirection, DEFAULT_INITIAL_DELAY, DEFAULT_SPEED,
};
pub use cursor::{PlaybackCursor, Position, Progress, StepResult};
pub use interp::{apply_element, apply_op, ApplyOutcome};
pub use inverse::{InverseStack, StackError, UndoEntry, UndoFrame};
pub use log::{Element, Frame, Log};
pub use op::{Annotation, AnnotationKind, Op};
pub use run::{run_path, LoadError, RunCatalog, RunEntry, RunFile, RunMeta, RUN_EXTENSION};
pub use session::ReplaySession;
