//! Port that records everything it receives, for assertions in tests.

use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::backend::Volume;
use crate::library::TrackStatus;
use crate::session::SessionSnapshot;

use super::port::{Controls, NotificationPort, TrackRow};

#[derive(Debug, Default)]
pub(crate) struct Recorded {
    pub statuses: Vec<String>,
    pub colors: Vec<(usize, TrackStatus)>,
    /// Volume ticks with the name of the thread that emitted them.
    pub ticks: Vec<(Volume, Option<String>)>,
    pub controls: Vec<Controls>,
    pub sessions: Vec<SessionSnapshot>,
    pub playlists: Vec<Vec<TrackRow>>,
    pub progress: usize,
    pub fades: Vec<bool>,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingPort {
    inner: Mutex<Recorded>,
}

impl RecordingPort {
    pub fn with<R>(&self, f: impl FnOnce(&mut Recorded) -> R) -> R {
        let mut r = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut r)
    }

    pub fn tick_values(&self) -> Vec<Volume> {
        self.with(|r| r.ticks.iter().map(|(v, _)| *v).collect())
    }

    pub fn colors_of(&self, index: usize) -> Vec<TrackStatus> {
        self.with(|r| {
            r.colors
                .iter()
                .filter(|(i, _)| *i == index)
                .map(|(_, s)| *s)
                .collect()
        })
    }

    pub fn clear(&self) {
        self.with(|r| *r = Recorded::default());
    }
}

impl NotificationPort for RecordingPort {
    fn on_status(&self, text: &str) {
        self.with(|r| r.statuses.push(text.to_string()));
    }

    fn on_track_color(&self, index: usize, status: TrackStatus) {
        self.with(|r| r.colors.push((index, status)));
    }

    fn on_volume_tick(&self, value: Volume) {
        let name = thread::current().name().map(str::to_string);
        self.with(|r| r.ticks.push((value, name)));
    }

    fn on_enable_controls(&self, controls: Controls) {
        self.with(|r| r.controls.push(controls));
    }

    fn on_session(&self, snapshot: SessionSnapshot) {
        self.with(|r| r.sessions.push(snapshot));
    }

    fn on_progress(&self, _position: std::time::Duration, _duration: Option<std::time::Duration>) {
        self.with(|r| r.progress += 1);
    }

    fn on_playlist(&self, rows: &[TrackRow]) {
        self.with(|r| r.playlists.push(rows.to_vec()));
    }

    fn on_fade(&self, active: bool) {
        self.with(|r| r.fades.push(active));
    }
}
