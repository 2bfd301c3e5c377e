//! Media backend adapter.
//!
//! The core never decodes audio itself. It drives an external engine through
//! [`MediaBackend`] and shares that one engine between the session and the
//! fade workers through [`SharedBackend`], which also hides the engine's
//! asynchronous settling behind two blocking, bounded waits.

mod output;
mod retry;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{PlayerError, Result};

pub use output::RodioBackend;
pub use retry::{Outcome, RetryPolicy, retry_with_backoff};
pub use types::{BackendState, MAX_VOLUME, Volume};

/// Contract of an external media-playback engine.
///
/// `play` may return before the engine actually plays; callers observe the
/// transition through `state`. Volume and mute writes on a stream that is not
/// playing are unreliable and may be reset by the engine.
pub trait MediaBackend: Send {
    /// Hand a media resource to the engine, replacing the current one.
    fn load(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn set_pause(&mut self, paused: bool);
    fn stop(&mut self);
    fn state(&self) -> BackendState;
    fn volume(&self) -> Volume;
    fn set_volume(&mut self, volume: Volume);
    fn is_muted(&self) -> bool;
    fn set_mute(&mut self, muted: bool);
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek(&mut self, position: Duration) -> Result<()>;
}

/// The single backend instance, shared by the session and its fade workers.
#[derive(Clone)]
pub struct SharedBackend(Arc<Mutex<Box<dyn MediaBackend>>>);

impl SharedBackend {
    pub fn new(backend: impl MediaBackend + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(backend))))
    }

    /// Run `f` with exclusive access to the backend.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn MediaBackend) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **guard)
    }

    pub fn state(&self) -> BackendState {
        self.with(|b| b.state())
    }

    /// Block until the backend reports `Playing`.
    ///
    /// `progress` sees every intermediate state with the time waited so far.
    /// Fails fast when the backend reports an error or an already ended stream.
    pub fn wait_until_playing(
        &self,
        policy: &RetryPolicy,
        mut progress: impl FnMut(BackendState, Duration),
    ) -> Result<()> {
        let mut last = BackendState::Idle;
        let outcome = retry_with_backoff(policy, |elapsed| {
            last = self.state();
            progress(last, elapsed);
            match last {
                BackendState::Playing => Ok(Some(())),
                BackendState::Error | BackendState::Ended => Err(PlayerError::PlaybackFailed(
                    format!("backend reported {} while starting", last.label()),
                )),
                _ => Ok(None),
            }
        })?;

        match outcome {
            Outcome::Ready(()) => {
                debug!("backend is playing");
                Ok(())
            }
            Outcome::TimedOut { elapsed } => Err(PlayerError::PlaybackFailed(format!(
                "backend still {} after {:.3}s",
                last.label(),
                elapsed.as_secs_f64()
            ))),
        }
    }

    /// Re-assert `mute = false` and `volume` until the backend reports both.
    ///
    /// Right after a state change some engines report a stale volume or
    /// silently re-mute; the writes are repeated with backoff until they stick.
    pub fn force_unmuted_volume(
        &self,
        volume: Volume,
        policy: &RetryPolicy,
        mut progress: impl FnMut(Duration),
    ) -> Result<()> {
        let outcome = retry_with_backoff(policy, |elapsed| {
            let settled = self.with(|b| {
                if !b.is_muted() && b.volume() == volume {
                    return true;
                }
                b.set_mute(false);
                b.set_volume(volume);
                false
            });
            if !settled {
                progress(elapsed);
            }
            Ok(settled.then_some(()))
        })?;

        match outcome {
            Outcome::Ready(()) => Ok(()),
            Outcome::TimedOut { elapsed } => {
                warn!(volume, ?elapsed, "backend did not confirm unmuted volume");
                Err(PlayerError::BackendDesyncTimeout { elapsed })
            }
        }
    }
}

#[cfg(test)]
mod tests;
