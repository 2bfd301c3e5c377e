//! Small shared types of the backend adapter.

/// Backend volume in percent; 100 is unity gain.
pub type Volume = u8;

/// Highest volume the panel lets the user pick.
pub const MAX_VOLUME: Volume = 150;

/// Coarse playback state as reported by a media backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BackendState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// `play()` was issued and the stream is starting.
    Opening,
    Playing,
    Paused,
    /// Media loaded but not started, or explicitly stopped.
    Stopped,
    /// The current media played to its end.
    Ended,
    Error,
}

impl BackendState {
    pub fn label(self) -> &'static str {
        match self {
            BackendState::Idle => "Idle",
            BackendState::Opening => "Opening",
            BackendState::Playing => "Playing",
            BackendState::Paused => "Paused",
            BackendState::Stopped => "Stopped",
            BackendState::Ended => "Ended",
            BackendState::Error => "Error",
        }
    }

    /// Playing or paused: a track is loaded and audible or resumable.
    pub fn is_active(self) -> bool {
        matches!(self, BackendState::Playing | BackendState::Paused)
    }
}
