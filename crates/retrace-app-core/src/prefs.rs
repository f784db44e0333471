// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved playback preferences shared by retrace tools.

use std::path::PathBuf;
use std::time::Duration;

use retrace_core::{AutoPlayConfig, DEFAULT_INITIAL_DELAY, DEFAULT_SPEED};
use serde::{Deserialize, Serialize};

use crate::config::Stored;

/// Auto-play timing, granularity and where runs live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackPrefs {
    /// Delay between auto-play firings, in milliseconds.
    pub speed_ms: u64,
    /// Delay before the first firing, in milliseconds.
    pub initial_delay_ms: u64,
    /// Auto-play by step instead of by frame.
    pub stepwise: bool,
    /// Directory searched for `<name>.mcg` runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_dir: Option<PathBuf>,
}

impl Default for PlaybackPrefs {
    fn default() -> Self {
        Self {
            speed_ms: duration_ms(DEFAULT_SPEED),
            initial_delay_ms: duration_ms(DEFAULT_INITIAL_DELAY),
            stepwise: false,
            run_dir: None,
        }
    }
}

impl Stored for PlaybackPrefs {
    const KEY: &'static str = "playback";
}

impl PlaybackPrefs {
    /// Auto-play configuration these prefs describe.
    pub fn autoplay_config(&self) -> AutoPlayConfig {
        AutoPlayConfig {
            speed: Duration::from_millis(self.speed_ms),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            stepwise: self.stepwise,
        }
    }

    /// Run directory, or the current directory when unset.
    pub fn run_dir_or_cwd(&self) -> PathBuf {
        self.run_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
