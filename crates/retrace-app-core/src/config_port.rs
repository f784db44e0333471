// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prefs-facing port so tools do not handle storage errors on every read.

use tracing::warn;

use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::prefs::PlaybackPrefs;

/// Loading and saving playback preferences.
pub trait PrefsPort {
    /// Load preferences; defaults if missing or unreadable.
    fn load_prefs(&self) -> PlaybackPrefs;
    /// Persist preferences.
    fn save_prefs(&self, prefs: &PlaybackPrefs) -> Result<(), ConfigError>;
}

impl<S: ConfigStore> PrefsPort for ConfigService<S> {
    fn load_prefs(&self) -> PlaybackPrefs {
        self.load_stored().unwrap_or_else(|err| {
            warn!(
                %err,
                location = %self.locate_stored::<PlaybackPrefs>(),
                "ignoring unreadable prefs"
            );
            PlaybackPrefs::default()
        })
    }

    fn save_prefs(&self, prefs: &PlaybackPrefs) -> Result<(), ConfigError> {
        self.save_stored(prefs)
    }
}
