use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::{MAX_VOLUME, Volume};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/bgplayer/config.toml` or `~/.config/bgplayer/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `BGPLAYER__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade in/out on track transitions and pause/resume.
    pub fade_enabled: bool,
    /// Target volume, 0..=150 (100 is unity gain).
    pub volume: Volume,
    /// Delay between single volume steps when starting/stopping a track (milliseconds).
    pub stop_fade_step_ms: u64,
    /// Delay between single volume steps when pausing/resuming (milliseconds).
    pub pause_fade_step_ms: u64,
    /// How long to wait for the backend to report `Playing` after `play()`.
    pub play_timeout_ms: u64,
    /// How long to keep re-asserting unmute + volume before giving up with a warning.
    pub unmute_timeout_ms: u64,
    /// Initial interval for backend polling; grows with backoff.
    pub poll_interval_ms: u64,
    /// Start the next track when the current one ends.
    pub auto_advance: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            fade_enabled: true,
            volume: 50,
            stop_fade_step_ms: 50,
            pause_fade_step_ms: 10,
            play_timeout_ms: 5000,
            unmute_timeout_ms: 1000,
            poll_interval_ms: 5,
            auto_advance: true,
        }
    }
}

impl AudioSettings {
    pub fn clamped_volume(&self) -> Volume {
        self.volume.min(MAX_VOLUME)
    }

    pub fn stop_fade_step(&self) -> Duration {
        Duration::from_millis(self.stop_fade_step_ms)
    }

    pub fn pause_fade_step(&self) -> Duration {
        Duration::from_millis(self.pause_fade_step_ms)
    }

    pub fn play_timeout(&self) -> Duration {
        Duration::from_millis(self.play_timeout_ms)
    }

    pub fn unmute_timeout(&self) -> Duration {
        Duration::from_millis(self.unmute_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to include hidden files (dotfiles).
    pub include_hidden: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "ogg".into(), "wav".into(), "flac".into()],
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// How often the panel refreshes the time position while a track plays (milliseconds).
    pub tick_interval_ms: u64,
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Number of seconds to scrub when pressing `h` / `l`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` key press.
    pub volume_step: Volume,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            header_text: " ~ Background music ~ ".to_string(),
            scrub_seconds: 5,
            volume_step: 5,
        }
    }
}

impl UiSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins when set.
    pub filter: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/bgplayer/bgplayer.log`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}
