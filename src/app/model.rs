//! Panel model: playlist rows, selection, gauges and the status line.

use std::time::Duration;

use bgplayer::backend::Volume;
use bgplayer::notify::{Controls, TrackRow, UiEvent};
use bgplayer::session::{SessionSnapshot, SessionState};

/// Everything the terminal panel shows.
#[derive(Debug, Default)]
pub struct Panel {
    pub tracks: Vec<TrackRow>,
    pub selected: usize,
    pub status: String,
    pub volume: Volume,
    pub fading: bool,
    pub session: Option<SessionSnapshot>,
    pub controls: Controls,
    pub position: Duration,
    pub duration: Option<Duration>,
    /// Seek target while the time slider is unlocked.
    pub scrub_target: Option<Duration>,
    /// Output detached from the session; the panel stops updating.
    pub hidden: bool,
    pub current_dir: Option<String>,
}

impl Panel {
    pub fn new(dir: String) -> Self {
        Self {
            current_dir: Some(dir),
            ..Self::default()
        }
    }

    /// Fold one session notification into the model.
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Status(text) => self.status = text,
            UiEvent::TrackColor { index, status } => {
                if let Some(row) = self.tracks.get_mut(index) {
                    row.status = status;
                }
            }
            UiEvent::VolumeTick(v) => self.volume = v,
            UiEvent::Controls(c) => {
                self.controls = c;
                if !c.lock {
                    self.scrub_target = None;
                }
            }
            UiEvent::Session(s) => {
                self.volume = s.volume;
                self.session = Some(s);
            }
            UiEvent::Progress { position, duration } => {
                self.position = position;
                self.duration = duration;
            }
            UiEvent::Playlist(rows) => {
                self.tracks = rows;
                self.selected = self.selected.min(self.tracks.len().saturating_sub(1));
            }
            UiEvent::Fade(active) => self.fading = active,
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.tracks.len() {
            self.selected += 1;
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn state(&self) -> SessionState {
        self.session.map(|s| s.state).unwrap_or_default()
    }

    /// Row of the track the session is on, if any.
    pub fn now_playing(&self) -> Option<usize> {
        self.session.and_then(|s| s.track_index)
    }

    /// Gauge label: `FAD` while a ramp drives the volume, `VOL` otherwise.
    pub fn volume_label(&self) -> String {
        if self.fading {
            format!("FAD: {}", self.volume)
        } else {
            format!("VOL: {}", self.volume)
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub_target.is_some()
    }

    /// Unlock the time slider. Returns `false` when no track is loaded.
    pub fn begin_scrub(&mut self) -> bool {
        if !self.controls.lock {
            return false;
        }
        self.scrub_target = Some(self.position);
        true
    }

    /// Move the unlocked slider by `delta_secs`, clamped to the track.
    pub fn scrub(&mut self, delta_secs: i64) {
        let Some(target) = self.scrub_target else {
            return;
        };
        let delta = Duration::from_secs(delta_secs.unsigned_abs());
        let mut next = if delta_secs < 0 {
            target.saturating_sub(delta)
        } else {
            target.saturating_add(delta)
        };
        if let Some(total) = self.duration {
            next = next.min(total);
        }
        self.scrub_target = Some(next);
    }

    /// Lock the slider again, yielding the position to seek to.
    pub fn end_scrub(&mut self) -> Option<Duration> {
        let target = self.scrub_target.take()?;
        self.position = target;
        Some(target)
    }

    /// Position shown on the time gauge.
    pub fn shown_position(&self) -> Duration {
        self.scrub_target.unwrap_or(self.position)
    }

    /// Fill ratio of the time gauge.
    pub fn time_ratio(&self) -> f64 {
        match self.duration {
            Some(total) if !total.is_zero() => {
                (self.shown_position().as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}
