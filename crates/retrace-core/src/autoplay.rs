// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Auto-play scheduling.
//!
//! There is no timer thread. [`AutoPlay`] only remembers when the next firing
//! is due; the host sleeps until [`AutoPlay::deadline`] and then polls the
//! cursor, which asks [`AutoPlay::take_due`] what to run.

use std::time::{Duration, Instant};

/// Delay between firings while playing.
pub const DEFAULT_SPEED: Duration = Duration::from_millis(800);
/// Delay before the first firing after `play`.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Which way auto-play moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayDirection {
    /// Towards the end of the log.
    #[default]
    Forward,
    /// Towards the start of the log.
    Reverse,
}

/// Navigation call a firing performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `do_step`.
    NextStep,
    /// `do_frame`.
    NextFrame,
    /// `prev_step`.
    PrevStep,
    /// `prev_frame`.
    PrevFrame,
}

/// Timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPlayConfig {
    /// Delay between firings.
    pub speed: Duration,
    /// Delay before the first firing.
    pub initial_delay: Duration,
    /// Step instead of frame granularity.
    pub stepwise: bool,
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            initial_delay: DEFAULT_INITIAL_DELAY,
            stepwise: false,
        }
    }
}

/// Playing state plus the pending deadline.
#[derive(Debug, Clone)]
pub struct AutoPlay {
    playing: bool,
    reverse: bool,
    stepwise: bool,
    speed: Duration,
    initial_delay: Duration,
    pending: Option<Instant>,
}

impl Default for AutoPlay {
    fn default() -> Self {
        Self::new(AutoPlayConfig::default())
    }
}

impl AutoPlay {
    /// Paused, forward.
    pub fn new(config: AutoPlayConfig) -> Self {
        Self {
            playing: false,
            reverse: false,
            stepwise: config.stepwise,
            speed: config.speed,
            initial_delay: config.initial_delay,
            pending: None,
        }
    }

    /// Whether auto-play is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether auto-play moves backwards.
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Whether firings move by step rather than by frame.
    pub fn is_stepwise(&self) -> bool {
        self.stepwise
    }

    /// Delay between firings.
    pub fn speed(&self) -> Duration {
        self.speed
    }

    /// Delay before the first firing.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Current direction.
    pub fn direction(&self) -> PlayDirection {
        if self.reverse {
            PlayDirection::Reverse
        } else {
            PlayDirection::Forward
        }
    }

    /// Sets the direction without touching the schedule.
    pub fn set_direction(&mut self, direction: PlayDirection) {
        self.reverse = direction == PlayDirection::Reverse;
    }

    /// Sets the granularity without touching the schedule.
    pub fn set_stepwise(&mut self, stepwise: bool) {
        self.stepwise = stepwise;
    }

    /// Sets the firing interval without touching the schedule.
    pub fn set_speed(&mut self, speed: Duration) {
        self.speed = speed;
    }

    /// Starts playing; the first firing is due after the initial delay.
    pub fn play(&mut self, now: Instant) {
        self.playing = true;
        self.pending = Some(after(now, self.initial_delay));
    }

    /// Stops playing and forgets the pending firing.
    pub fn pause(&mut self) {
        self.playing = false;
        self.pending = None;
    }

    /// When the next firing is due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Whether a firing is pending.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The call a firing makes under the current flags.
    pub fn action(&self) -> Action {
        match (self.reverse, self.stepwise) {
            (false, true) => Action::NextStep,
            (false, false) => Action::NextFrame,
            (true, true) => Action::PrevStep,
            (true, false) => Action::PrevFrame,
        }
    }

    /// Consumes a due firing. `None` when nothing is due or playback was
    /// paused in the meantime.
    pub fn take_due(&mut self, now: Instant) -> Option<Action> {
        let due = self.pending?;
        if now < due {
            return None;
        }
        self.pending = None;
        self.playing.then(|| self.action())
    }

    /// Schedules the next firing one interval after `now`, if still playing.
    pub fn reschedule(&mut self, now: Instant) {
        if self.playing {
            self.pending = Some(after(now, self.speed));
        }
    }
}

fn after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay).unwrap_or(now)
}
