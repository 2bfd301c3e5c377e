//! Notification port: the only way the playback core talks to a UI.
//!
//! The session pushes human-readable status text and structured updates into
//! a [`NotificationPort`]. A port may be a visible window, a log, or nothing at
//! all; correctness never depends on which one is attached.

mod channel;
mod port;

pub use channel::{ChannelPort, UiEvent};
pub use port::{Controls, NotificationPort, NullPort, TracingPort, TrackRow};

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::backend::Volume;
use crate::library::TrackStatus;
use crate::session::SessionSnapshot;

/// Swappable slot holding the current port, plus the latest status line.
///
/// Calls are forwarded outside the slot lock so a slow port never blocks
/// attach/detach.
pub struct Notifier {
    port: RwLock<Arc<dyn NotificationPort>>,
    last_status: Mutex<String>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Arc::new(NullPort))
    }
}

impl Notifier {
    pub fn new(port: Arc<dyn NotificationPort>) -> Self {
        Self {
            port: RwLock::new(port),
            last_status: Mutex::new(String::new()),
        }
    }

    pub fn attach(&self, port: Arc<dyn NotificationPort>) {
        *self.port.write().unwrap_or_else(PoisonError::into_inner) = port;
        debug!("notification port attached");
    }

    /// Drop the current port; later updates only reach the log.
    pub fn detach(&self) {
        self.attach(Arc::new(NullPort));
    }

    fn port(&self) -> Arc<dyn NotificationPort> {
        self.port
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_status(&self) -> String {
        self.last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Post a status line.
    ///
    /// The port call and the `last_status` write happen under one lock, so
    /// `last_status()` always matches the last line a port was shown. Ports
    /// must not call back into `last_status()` from `on_status`.
    pub fn status(&self, text: impl Into<String>) {
        let text = text.into();
        trace!(status = %text);
        let port = self.port();
        let mut last = self.last_status.lock().unwrap_or_else(PoisonError::into_inner);
        port.on_status(&text);
        *last = text;
    }

    pub fn track_color(&self, index: usize, status: TrackStatus) {
        debug!(index, status = status.label(), "track status changed");
        self.port().on_track_color(index, status);
    }

    pub fn volume_tick(&self, value: Volume) {
        self.port().on_volume_tick(value);
    }

    pub fn controls(&self, controls: Controls) {
        self.port().on_enable_controls(controls);
    }

    pub fn session(&self, snapshot: SessionSnapshot) {
        info!(
            state = snapshot.state.label(),
            volume = snapshot.volume,
            track = ?snapshot.track_index,
            "session"
        );
        self.port().on_session(snapshot);
    }

    pub fn progress(&self, position: Duration, duration: Option<Duration>) {
        self.port().on_progress(position, duration);
    }

    pub fn playlist(&self, rows: &[TrackRow]) {
        self.port().on_playlist(rows);
    }

    pub fn fade(&self, active: bool) {
        self.port().on_fade(active);
    }
}

#[cfg(test)]
pub(crate) mod recording;
