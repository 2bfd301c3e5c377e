//! Playback session: the state machine tying backend, playlist and fades together.
//!
//! All operations are synchronous and may block for the length of a fade or a
//! backend start. Hosts with an interactive thread use the `*_async` wrappers,
//! which run the same operation on a worker thread. Only one operation drives
//! the backend at a time; results are reported through the [`Notifier`] as
//! status text plus a structured [`SessionSnapshot`].

mod state;

pub use state::{SessionConfig, SessionSnapshot, SessionState, TrackSelection};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::backend::{BackendState, MAX_VOLUME, RetryPolicy, SharedBackend, Volume};
use crate::config::LibrarySettings;
use crate::error::{PlayerError, Result};
use crate::fade::{FadeController, FadeHandle, FadeOutcome, FadePlan};
use crate::library::{self, Playlist, TrackStatus};
use crate::notify::{Controls, NotificationPort, Notifier, TrackRow};

use state::Cursor;

/// Position and length of the loaded track, as published by [`PlaybackSession::tick`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Progress {
    pub position: Duration,
    pub duration: Option<Duration>,
}

struct Inner {
    backend: SharedBackend,
    fades: FadeController,
    notifier: Arc<Notifier>,
    cursor: Mutex<Cursor>,
    /// Serializes operations that drive the backend.
    op: Mutex<()>,
    library: LibrarySettings,
}

/// Cheap, cloneable handle to one playback session.
#[derive(Clone)]
pub struct PlaybackSession {
    inner: Arc<Inner>,
}

impl PlaybackSession {
    pub fn new(backend: SharedBackend, config: SessionConfig, library: LibrarySettings) -> Self {
        let config = SessionConfig {
            volume: config.volume.min(MAX_VOLUME),
            ..config
        };
        let cursor = Cursor {
            config,
            ..Cursor::default()
        };
        Self {
            inner: Arc::new(Inner {
                backend,
                fades: FadeController::new(0),
                notifier: Arc::new(Notifier::default()),
                cursor: Mutex::new(cursor),
                op: Mutex::new(()),
                library,
            }),
        }
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.inner.notifier
    }

    /// Route notifications to `port` and bring it up to date.
    pub fn attach_port(&self, port: Arc<dyn NotificationPort>) {
        self.inner.notifier.attach(port);
        let rows = self.rows();
        let notifier = &self.inner.notifier;
        notifier.playlist(&rows);
        notifier.fade(self.inner.fades.is_fading());
        let last = notifier.last_status();
        if !last.is_empty() {
            notifier.status(last);
        }
        self.publish();
    }

    pub fn detach_port(&self) {
        self.inner.notifier.detach();
    }

    pub fn last_status(&self) -> String {
        self.inner.notifier.last_status()
    }

    fn cursor(&self) -> MutexGuard<'_, Cursor> {
        self.inner
            .cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn op(&self) -> MutexGuard<'_, ()> {
        self.inner.op.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The op lock if no other operation holds it.
    fn try_op(&self) -> Option<MutexGuard<'_, ()>> {
        match self.inner.op.try_lock() {
            Ok(g) => Some(g),
            Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn config(&self) -> SessionConfig {
        self.cursor().config
    }

    fn rows(&self) -> Vec<TrackRow> {
        self.cursor()
            .playlist
            .tracks()
            .iter()
            .map(TrackRow::from)
            .collect()
    }

    pub fn playlist(&self) -> Playlist {
        self.cursor().playlist.clone()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor().current
    }

    pub fn state(&self) -> SessionState {
        self.cursor().state
    }

    /// Target volume, regardless of any ramp in progress.
    pub fn volume(&self) -> Volume {
        self.config().volume
    }

    pub fn fade_enabled(&self) -> bool {
        self.config().fade_enabled
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let fading = self.inner.fades.is_fading();
        let level = self.inner.fades.level();
        let c = self.cursor();
        SessionSnapshot {
            state: c.state,
            volume: if fading { level } else { c.config.volume },
            track_index: c.loaded.or(c.current),
            fade_enabled: c.config.fade_enabled,
        }
    }

    pub fn controls(&self) -> Controls {
        let c = self.cursor();
        let active = matches!(c.state, SessionState::Playing | SessionState::Paused);
        Controls {
            play: !c.playlist.is_empty(),
            pause: active,
            lock: active,
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        let controls = self.controls();
        self.inner.notifier.session(snapshot);
        self.inner.notifier.controls(controls);
    }

    fn set_state(&self, state: SessionState) {
        let previous = std::mem::replace(&mut self.cursor().state, state);
        if previous != state {
            debug!(from = previous.label(), to = state.label(), "session state");
        }
    }

    /// Move a track's status forward, telling the port only on a real change.
    fn mark(&self, index: usize, status: TrackStatus) {
        let changed = self.cursor().playlist.set_status(index, status);
        if changed {
            self.inner.notifier.track_color(index, status);
        }
    }

    /// Log `e`, turn it into a status line and hand it back.
    fn report(&self, context: &str, e: PlayerError) -> PlayerError {
        if e.is_warning() {
            warn!(error = %e, "{context}");
        } else {
            error!(error = %e, "{context}");
        }
        self.inner.notifier.status(format!("{context}: {e}"));
        e
    }

    /// Replace the playlist. A playing track keeps playing until the next transition.
    pub fn set_playlist(&self, playlist: Playlist) -> usize {
        let _op = self.op();
        let len = playlist.len();
        {
            let mut c = self.cursor();
            c.playlist = playlist;
            c.current = None;
            c.loaded = None;
        }
        info!(tracks = len, "playlist replaced");
        let rows = self.rows();
        self.inner.notifier.playlist(&rows);
        self.publish();
        len
    }

    /// Scan `dir` and make the result the playlist.
    pub fn load_playlist(&self, dir: &Path) -> Result<usize> {
        match library::load(dir, &self.inner.library) {
            Ok(playlist) => {
                let len = self.set_playlist(playlist);
                self.inner
                    .notifier
                    .status(format!("Loaded {len} tracks from {}", dir.display()));
                Ok(len)
            }
            Err(e) => Err(self.report("Cannot load playlist", e)),
        }
    }

    /// Move the cursor to an explicit row or to the next track (wrapping).
    pub fn select_track(&self, selection: TrackSelection) -> Result<usize> {
        let picked = {
            let mut c = self.cursor();
            let len = c.playlist.len();
            if len == 0 {
                Err(PlayerError::EmptyPlaylist)
            } else {
                let index = match selection {
                    TrackSelection::Explicit(i) => i,
                    TrackSelection::Next => c.current.map_or(0, |i| (i + 1) % len),
                };
                if index < len {
                    c.current = Some(index);
                    Ok(index)
                } else {
                    Err(PlayerError::IndexOutOfRange { index, len })
                }
            }
        };
        match picked {
            Ok(index) => {
                debug!(index, ?selection, "track selected");
                Ok(index)
            }
            Err(e) => Err(self.report("Cannot select track", e)),
        }
    }

    /// Start the track under the cursor, or the first one if none is selected.
    pub fn play_selected(&self) -> Result<()> {
        let index = {
            let mut c = self.cursor();
            if c.playlist.is_empty() {
                None
            } else {
                Some(*c.current.get_or_insert(0))
            }
        };
        match index {
            Some(i) => self.play_index(i),
            None => Err(self.report("Cannot play", PlayerError::EmptyPlaylist)),
        }
    }

    fn play_index(&self, index: usize) -> Result<()> {
        self.inner.fades.cancel_active();
        let op = self.op();

        let (found, len, previous, config) = {
            let c = self.cursor();
            (c.playlist.get(index).cloned(), c.playlist.len(), c.loaded, c.config)
        };
        let track = match found {
            Some(t) => t,
            None if len == 0 => return Err(self.report("Cannot play", PlayerError::EmptyPlaylist)),
            None => {
                let e = PlayerError::IndexOutOfRange { index, len };
                return Err(self.report("Cannot play", e));
            }
        };
        let backend = &self.inner.backend;
        let notifier = &self.inner.notifier;

        let was = backend.state();
        if let Some(prev) = previous {
            let status = if was.is_active() {
                TrackStatus::Skipped
            } else {
                TrackStatus::PlayedToEnd
            };
            self.mark(prev, status);
        }
        if was == BackendState::Playing && config.fade_enabled {
            let plan = FadePlan::new(self.inner.fades.level(), 0, config.stop_fade_step);
            self.inner.fades.run(plan, backend, notifier);
        }

        info!(index, title = %track.title, "starting track");
        self.set_state(SessionState::Loading);
        notifier.status(format!("Loading: {}", track.title));
        self.publish();

        let policy = RetryPolicy::new(config.poll_interval, config.play_timeout);
        let started = backend
            .with(|b| {
                b.load(&track.path)?;
                b.play()
            })
            .and_then(|()| {
                backend.wait_until_playing(&policy, |state, waited| {
                    notifier.status(format!("{} [{:.3}s]", state.label(), waited.as_secs_f64()));
                })
            });

        if let Err(e) = started {
            backend.with(|b| b.stop());
            {
                let mut c = self.cursor();
                c.state = SessionState::Idle;
                c.loaded = None;
            }
            let e = self.report("Playback FAILED", e);
            self.publish();
            return Err(e);
        }

        {
            let mut c = self.cursor();
            c.loaded = Some(index);
            c.state = SessionState::Playing;
            c.seeking = false;
        }
        self.mark(index, TrackStatus::PlayingNow);

        let start_volume = if config.fade_enabled { 0 } else { config.volume };
        let unmute = RetryPolicy::new(config.poll_interval, config.unmute_timeout);
        if let Err(e) = backend.force_unmuted_volume(start_volume, &unmute, |waited| {
            notifier.status(format!("Trying to unmute... [{:.3}s]", waited.as_secs_f64()));
        }) {
            self.report("Volume not confirmed", e);
        }
        self.inner.fades.set_level(start_volume);

        // set_volume only records the target while the track loads.
        let volume = self.cursor().config.volume;
        if !config.fade_enabled {
            if volume != start_volume {
                backend.with(|b| b.set_volume(volume));
                self.inner.fades.set_level(volume);
            }
            notifier.status(format!("Playing: {} Vol: {volume}", track.title));
            self.publish();
            return Ok(());
        }

        notifier.status(format!("Playing: {}", track.title));
        self.publish();
        let plan = FadePlan::new(0, volume, config.stop_fade_step);
        let handle = self.inner.fades.start(plan, backend, notifier);
        drop(op);
        self.settle_fade(&handle, index);
        Ok(())
    }

    /// Wait for a fade-in and apply a volume change made while it ran.
    fn settle_fade(&self, handle: &FadeHandle, index: usize) {
        let FadeOutcome::Completed(reached) = handle.wait() else {
            return;
        };
        let Some(_op) = self.try_op() else {
            return;
        };
        let (wanted, current) = {
            let c = self.cursor();
            let current = c.state == SessionState::Playing && c.loaded == Some(index);
            (c.config.volume, current)
        };
        if current && wanted != reached && !self.inner.fades.is_fading() {
            self.inner.backend.with(|b| b.set_volume(wanted));
            self.inner.fades.set_level(wanted);
            self.inner.notifier.volume_tick(wanted);
            self.inner.notifier.status(format!("Vol: {wanted}"));
        }
        self.publish();
    }

    /// Pause (`true`) or resume (`false`) the loaded track, fading when enabled.
    pub fn pause(&self, paused: bool) -> Result<()> {
        self.inner.fades.cancel_active();
        let op = self.op();

        let (state, loaded, config, empty) = {
            let c = self.cursor();
            (c.state, c.loaded, c.config, c.playlist.is_empty())
        };
        let context = if paused { "Cannot pause" } else { "Cannot resume" };
        if empty {
            return Err(self.report(context, PlayerError::EmptyPlaylist));
        }
        let backend = &self.inner.backend;
        let notifier = &self.inner.notifier;

        match (paused, state) {
            (true, SessionState::Paused) | (false, SessionState::Playing) => Ok(()),
            (true, SessionState::Playing) => {
                if config.fade_enabled {
                    let plan = FadePlan::new(self.inner.fades.level(), 0, config.pause_fade_step);
                    self.inner.fades.run(plan, backend, notifier);
                }
                backend.with(|b| b.set_pause(true));
                self.set_state(SessionState::Paused);
                info!("paused");
                notifier.status("Paused");
                self.publish();
                Ok(())
            }
            (false, SessionState::Paused) => {
                backend.with(|b| b.set_pause(false));
                let policy = RetryPolicy::new(config.poll_interval, config.play_timeout);
                if let Err(e) = backend.wait_until_playing(&policy, |state, waited| {
                    notifier.status(format!("{} [{:.3}s]", state.label(), waited.as_secs_f64()));
                }) {
                    backend.with(|b| b.stop());
                    {
                        let mut c = self.cursor();
                        c.state = SessionState::Idle;
                        c.loaded = None;
                    }
                    let e = self.report("Resume FAILED", e);
                    self.publish();
                    return Err(e);
                }
                self.set_state(SessionState::Playing);
                info!("resumed");

                let volume = self.cursor().config.volume;
                if !config.fade_enabled {
                    backend.with(|b| b.set_volume(volume));
                    self.inner.fades.set_level(volume);
                    notifier.status(format!("Resumed Vol: {volume}"));
                    self.publish();
                    return Ok(());
                }

                notifier.status("Resumed");
                self.publish();
                let plan = FadePlan::new(self.inner.fades.level(), volume, config.pause_fade_step);
                let handle = self.inner.fades.start(plan, backend, notifier);
                drop(op);
                if let Some(index) = loaded {
                    self.settle_fade(&handle, index);
                } else {
                    handle.wait();
                }
                Ok(())
            }
            _ => Err(self.report(context, PlayerError::NothingPlaying)),
        }
    }

    pub fn set_fade_enabled(&self, enabled: bool) {
        self.cursor().config.fade_enabled = enabled;
        info!(enabled, "fade toggled");
        self.inner
            .notifier
            .status(if enabled { "Fade: on" } else { "Fade: off" });
        self.publish();
    }

    /// Set the target volume (clamped to 0..=150).
    ///
    /// Applied to the backend right away only while a track plays, no fade
    /// runs and no other operation is in flight; otherwise it takes effect on
    /// the next fade or transition.
    pub fn set_volume(&self, volume: Volume) -> Volume {
        let volume = volume.min(MAX_VOLUME);
        let playing = {
            let mut c = self.cursor();
            c.config.volume = volume;
            c.state == SessionState::Playing
        };
        if playing
            && !self.inner.fades.is_fading()
            && let Some(_op) = self.try_op()
        {
            self.inner.backend.with(|b| b.set_volume(volume));
            self.inner.fades.set_level(volume);
            self.inner.notifier.volume_tick(volume);
        }
        self.inner.notifier.status(format!("Vol: {volume}"));
        self.publish();
        volume
    }

    pub fn position(&self) -> Option<Duration> {
        self.inner.backend.with(|b| b.position())
    }

    /// Length of the loaded track, from the backend or the scanned metadata.
    pub fn duration(&self) -> Option<Duration> {
        let from_backend = self.inner.backend.with(|b| b.duration());
        from_backend.or_else(|| {
            let c = self.cursor();
            c.loaded
                .and_then(|i| c.playlist.get(i))
                .and_then(|t| t.duration)
        })
    }

    /// Periodic refresh driven by the host's timer.
    ///
    /// Detects the end of the loaded track and publishes its position unless a
    /// seek drag is in progress.
    pub fn tick(&self) -> Option<Progress> {
        let (state, seeking) = {
            let c = self.cursor();
            (c.state, c.seeking)
        };
        match state {
            SessionState::Idle | SessionState::Loading | SessionState::Ended => return None,
            SessionState::Playing if self.inner.backend.state() == BackendState::Ended => {
                self.handle_end();
                return None;
            }
            _ => {}
        }
        if seeking {
            return None;
        }
        let progress = Progress {
            position: self.position().unwrap_or_default(),
            duration: self.duration(),
        };
        self.inner
            .notifier
            .progress(progress.position, progress.duration);
        Some(progress)
    }

    fn handle_end(&self) {
        let Some(op) = self.try_op() else {
            return;
        };
        let ended = {
            let mut c = self.cursor();
            if c.state != SessionState::Playing {
                None
            } else {
                c.state = SessionState::Ended;
                let title = c
                    .loaded
                    .and_then(|i| c.playlist.get(i))
                    .map(|t| t.title.clone());
                Some((c.loaded, title, c.config.auto_advance))
            }
        };
        let Some((loaded, title, auto_advance)) = ended else {
            return;
        };
        if let Some(index) = loaded {
            self.mark(index, TrackStatus::PlayedToEnd);
        }
        info!(?title, "track ended");
        self.inner
            .notifier
            .status(format!("Ended: {}", title.unwrap_or_default()));
        self.publish();
        drop(op);

        if auto_advance {
            let _ = self.skip_async(TrackSelection::Next);
        }
    }

    /// Hold back position updates while the user drags the time slider.
    pub fn begin_seek(&self) {
        self.cursor().seeking = true;
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        let state = {
            let mut c = self.cursor();
            c.seeking = false;
            c.state
        };
        if !matches!(state, SessionState::Playing | SessionState::Paused) {
            return Err(self.report("Cannot seek", PlayerError::NothingPlaying));
        }
        match self.inner.backend.with(|b| b.seek(position)) {
            Ok(()) => {
                debug!(?position, "seek");
                let secs = position.as_secs();
                self.inner
                    .notifier
                    .status(format!("Seek to {:02}:{:02}", secs / 60, secs % 60));
                Ok(())
            }
            Err(e) => Err(self.report("Cannot seek", e)),
        }
    }

    /// Fade out whatever plays and stop the backend.
    pub fn shutdown(&self) {
        self.inner.fades.cancel_active();
        let _op = self.op();
        let config = self.config();
        let backend = &self.inner.backend;
        if backend.state() == BackendState::Playing && config.fade_enabled {
            let plan = FadePlan::new(self.inner.fades.level(), 0, config.stop_fade_step);
            self.inner.fades.run(plan, backend, &self.inner.notifier);
        }
        backend.with(|b| b.stop());
        {
            let mut c = self.cursor();
            c.state = SessionState::Idle;
            c.loaded = None;
        }
        info!("session stopped");
        self.inner.notifier.status("Stopped");
        self.publish();
    }

    fn spawn_op(
        &self,
        what: &'static str,
        f: impl FnOnce(&Self) -> Result<()> + Send + 'static,
    ) -> Option<JoinHandle<()>> {
        let session = self.clone();
        let spawned = thread::Builder::new()
            .name("bgplayer-op".to_string())
            .spawn(move || {
                if let Err(e) = f(&session) {
                    debug!(error = %e, "{what} failed");
                }
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "cannot spawn worker for {what}");
                self.inner
                    .notifier
                    .status(format!("Cannot start {what}: {e}"));
                None
            }
        }
    }

    /// Select a track now and start it on a worker thread.
    pub fn skip_async(&self, selection: TrackSelection) -> Result<Option<JoinHandle<()>>> {
        let index = self.select_track(selection)?;
        Ok(self.spawn_op("skip", move |s| s.play_index(index)))
    }

    pub fn play_async(&self) -> Option<JoinHandle<()>> {
        self.spawn_op("play", |s| s.play_selected())
    }

    pub fn pause_async(&self, paused: bool) -> Option<JoinHandle<()>> {
        self.spawn_op("pause", move |s| s.pause(paused))
    }
}
