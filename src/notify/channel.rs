//! Port that marshals updates onto the UI thread over a channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::backend::Volume;
use crate::library::TrackStatus;
use crate::session::SessionSnapshot;

use super::port::{Controls, NotificationPort, TrackRow};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Status(String),
    TrackColor { index: usize, status: TrackStatus },
    VolumeTick(Volume),
    Controls(Controls),
    Session(SessionSnapshot),
    Progress {
        position: Duration,
        duration: Option<Duration>,
    },
    Playlist(Vec<TrackRow>),
    Fade(bool),
}

/// Each callback becomes a [`UiEvent`] the UI thread drains between frames.
///
/// Once the receiver is gone (window closed) events are dropped silently.
pub struct ChannelPort {
    tx: Sender<UiEvent>,
}

impl ChannelPort {
    pub fn new() -> (Self, Receiver<UiEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

impl NotificationPort for ChannelPort {
    fn on_status(&self, text: &str) {
        self.send(UiEvent::Status(text.to_string()));
    }

    fn on_track_color(&self, index: usize, status: TrackStatus) {
        self.send(UiEvent::TrackColor { index, status });
    }

    fn on_volume_tick(&self, value: Volume) {
        self.send(UiEvent::VolumeTick(value));
    }

    fn on_enable_controls(&self, controls: Controls) {
        self.send(UiEvent::Controls(controls));
    }

    fn on_session(&self, snapshot: SessionSnapshot) {
        self.send(UiEvent::Session(snapshot));
    }

    fn on_progress(&self, position: Duration, duration: Option<Duration>) {
        self.send(UiEvent::Progress { position, duration });
    }

    fn on_playlist(&self, rows: &[TrackRow]) {
        self.send(UiEvent::Playlist(rows.to_vec()));
    }

    fn on_fade(&self, active: bool) {
        self.send(UiEvent::Fade(active));
    }
}
