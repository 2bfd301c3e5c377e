//! Error types for the playback core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    /// An operation needed a playlist but none (or an empty one) is loaded.
    #[error("playlist is empty")]
    EmptyPlaylist,

    /// Pause/resume requested while nothing is loaded in the backend.
    #[error("nothing is playing")]
    NothingPlaying,

    #[error("track index {index} out of range (playlist has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot read directory {path:?}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path:?}: {reason}")]
    MediaLoadFailed { path: PathBuf, reason: String },

    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    /// Mute/volume confirmation did not settle in time. Recoverable.
    #[error("backend did not confirm volume after {elapsed:?}")]
    BackendDesyncTimeout { elapsed: Duration },

    #[error("audio output unavailable: {0}")]
    AudioOutput(String),

    #[error("seek failed: {0}")]
    SeekFailed(String),
}

impl PlayerError {
    /// Whether playback can carry on after this error.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::BackendDesyncTimeout { .. } | Self::EmptyPlaylist | Self::NothingPlaying
        )
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
