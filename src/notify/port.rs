use std::time::Duration;

use tracing::{debug, info};

use crate::backend::Volume;
use crate::library::{Track, TrackStatus};
use crate::session::SessionSnapshot;

/// Which panel controls may currently be used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Controls {
    pub play: bool,
    pub pause: bool,
    /// The time-slider lock toggle.
    pub lock: bool,
}

/// One playlist row as a window shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub title: String,
    pub status: TrackStatus,
}

impl From<&Track> for TrackRow {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            status: track.status(),
        }
    }
}

/// Sink for session updates. Every method defaults to a no-op.
///
/// Methods may be called from worker threads; implementations backed by a UI
/// must defer the actual widget update onto the UI's own thread.
pub trait NotificationPort: Send + Sync {
    fn on_status(&self, _text: &str) {}
    fn on_track_color(&self, _index: usize, _status: TrackStatus) {}
    fn on_volume_tick(&self, _value: Volume) {}
    fn on_enable_controls(&self, _controls: Controls) {}
    /// Structured counterpart of the status text.
    fn on_session(&self, _snapshot: SessionSnapshot) {}
    fn on_progress(&self, _position: Duration, _duration: Option<Duration>) {}
    /// The whole playlist was replaced (or a window needs a full resync).
    fn on_playlist(&self, _rows: &[TrackRow]) {}
    /// A volume ramp started (`true`) or finished (`false`).
    fn on_fade(&self, _active: bool) {}
}

/// Port used when no window is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPort;

impl NotificationPort for NullPort {}

/// Headless port that writes every update to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPort;

impl NotificationPort for TracingPort {
    fn on_status(&self, text: &str) {
        info!(target: "bgplayer::status", "{text}");
    }

    fn on_track_color(&self, index: usize, status: TrackStatus) {
        info!(target: "bgplayer::status", index, status = status.label(), "track");
    }

    fn on_volume_tick(&self, value: Volume) {
        debug!(target: "bgplayer::status", value, "volume");
    }

    fn on_enable_controls(&self, controls: Controls) {
        debug!(target: "bgplayer::status", ?controls, "controls");
    }

    fn on_progress(&self, position: Duration, duration: Option<Duration>) {
        debug!(target: "bgplayer::status", ?position, ?duration, "progress");
    }

    fn on_playlist(&self, rows: &[TrackRow]) {
        info!(target: "bgplayer::status", tracks = rows.len(), "playlist");
    }
}
