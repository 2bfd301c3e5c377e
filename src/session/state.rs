use std::time::Duration;

use crate::backend::Volume;
use crate::config::AudioSettings;
use crate::library::Playlist;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No track loaded.
    #[default]
    Idle,
    /// Media handed to the backend, waiting for it to play.
    Loading,
    Playing,
    Paused,
    /// The loaded track played to its end.
    Ended,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Loading => "Loading",
            SessionState::Playing => "Playing",
            SessionState::Paused => "Paused",
            SessionState::Ended => "Ended",
        }
    }
}

/// Structured session status pushed alongside every status line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Target volume, or the last value written while a fade runs.
    pub volume: Volume,
    pub track_index: Option<usize>,
    pub fade_enabled: bool,
}

/// How the next track is chosen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackSelection {
    /// A row picked in the window.
    Explicit(usize),
    /// The track after the current one, wrapping around.
    Next,
}

/// Playback tunables supplied by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub fade_enabled: bool,
    pub volume: Volume,
    pub stop_fade_step: Duration,
    pub pause_fade_step: Duration,
    pub play_timeout: Duration,
    pub unmute_timeout: Duration,
    pub poll_interval: Duration,
    pub auto_advance: bool,
}

impl From<&AudioSettings> for SessionConfig {
    fn from(audio: &AudioSettings) -> Self {
        Self {
            fade_enabled: audio.fade_enabled,
            volume: audio.clamped_volume(),
            stop_fade_step: audio.stop_fade_step(),
            pause_fade_step: audio.pause_fade_step(),
            play_timeout: audio.play_timeout(),
            unmute_timeout: audio.unmute_timeout(),
            poll_interval: audio.poll_interval(),
            auto_advance: audio.auto_advance,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&AudioSettings::default())
    }
}

/// Mutable session state, guarded by one mutex.
#[derive(Debug, Default)]
pub(super) struct Cursor {
    pub playlist: Playlist,
    /// Selection cursor; `None` until a track is selected.
    pub current: Option<usize>,
    /// Track currently handed to the backend.
    pub loaded: Option<usize>,
    pub state: SessionState,
    /// A seek drag is in progress; position updates are held back.
    pub seeking: bool,
    pub config: SessionConfig,
}
