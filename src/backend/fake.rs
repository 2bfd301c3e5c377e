//! Scripted in-memory backend for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{PlayerError, Result};

use super::MediaBackend;
use super::types::{BackendState, Volume};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub state: BackendState,
    pub loaded: Option<PathBuf>,
    pub volume: Volume,
    pub muted: bool,

    /// `state()` calls that still report `Opening` after each `play()`.
    pub opening_polls: u32,
    pending_opening: u32,
    /// `volume()` calls that report `stale_volume` after each `play()`.
    pub stale_volume_reads: u32,
    pub stale_volume: Volume,
    pending_stale: u32,
    /// Mute the stream whenever playback starts.
    pub mute_on_play: bool,
    /// Never report the written volume (desync forever).
    pub ignore_volume: bool,
    /// Stay in `Opening` forever after `play()`.
    pub never_plays: bool,
    pub fail_load: HashSet<PathBuf>,
    pub fail_play: bool,

    pub position: Duration,
    pub duration: Option<Duration>,

    pub loads: Vec<PathBuf>,
    pub volume_writes: Vec<Volume>,
    pub pauses: Vec<bool>,
    pub seeks: Vec<Duration>,
    pub stops: u32,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inspect<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut s = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut s)
    }

    /// Simulate the current media running out.
    pub fn finish_track(&self) {
        self.inspect(|s| s.state = BackendState::Ended);
    }
}

impl MediaBackend for FakeBackend {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.inspect(|s| {
            s.loads.push(path.to_path_buf());
            if s.fail_load.contains(path) {
                s.loaded = None;
                s.state = BackendState::Error;
                return Err(PlayerError::MediaLoadFailed {
                    path: path.to_path_buf(),
                    reason: "scripted failure".to_string(),
                });
            }
            s.loaded = Some(path.to_path_buf());
            s.state = BackendState::Stopped;
            s.position = Duration::ZERO;
            Ok(())
        })
    }

    fn play(&mut self) -> Result<()> {
        self.inspect(|s| {
            if s.fail_play || s.loaded.is_none() {
                return Err(PlayerError::PlaybackFailed("scripted failure".to_string()));
            }
            s.state = BackendState::Opening;
            s.pending_opening = s.opening_polls;
            s.pending_stale = s.stale_volume_reads;
            if s.mute_on_play {
                s.muted = true;
            }
            Ok(())
        })
    }

    fn set_pause(&mut self, paused: bool) {
        self.inspect(|s| {
            s.pauses.push(paused);
            s.state = if paused {
                BackendState::Paused
            } else {
                BackendState::Playing
            };
        });
    }

    fn stop(&mut self) {
        self.inspect(|s| {
            s.stops += 1;
            s.state = BackendState::Stopped;
        });
    }

    fn state(&self) -> BackendState {
        self.inspect(|s| {
            if s.state == BackendState::Opening && !s.never_plays {
                if s.pending_opening == 0 {
                    s.state = BackendState::Playing;
                } else {
                    s.pending_opening -= 1;
                }
            }
            s.state
        })
    }

    fn volume(&self) -> Volume {
        self.inspect(|s| {
            if s.pending_stale > 0 {
                s.pending_stale -= 1;
                return s.stale_volume;
            }
            if s.ignore_volume {
                return s.volume.wrapping_add(1);
            }
            s.volume
        })
    }

    fn set_volume(&mut self, volume: Volume) {
        self.inspect(|s| {
            s.volume_writes.push(volume);
            s.volume = volume;
        });
    }

    fn is_muted(&self) -> bool {
        self.inspect(|s| s.muted)
    }

    fn set_mute(&mut self, muted: bool) {
        self.inspect(|s| s.muted = muted);
    }

    fn position(&self) -> Option<Duration> {
        self.inspect(|s| s.loaded.as_ref().map(|_| s.position))
    }

    fn duration(&self) -> Option<Duration> {
        self.inspect(|s| s.duration)
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.inspect(|s| {
            if s.loaded.is_none() {
                return Err(PlayerError::SeekFailed("no media loaded".to_string()));
            }
            s.seeks.push(position);
            s.position = position;
            Ok(())
        })
    }
}
