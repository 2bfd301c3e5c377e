//! Fade controller: linear, cancellable volume ramps.
//!
//! A ramp writes every integer volume between two levels to the backend,
//! waiting `step_delay` between writes, on its own thread. The controller is
//! single-flight: starting a ramp cancels the previous one and joins its
//! thread before the new one begins, so two ramps never drive the backend
//! volume at the same time.

mod cancel;
mod ramp;

pub use ramp::{Ramp, ramp};

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{SharedBackend, Volume};
use crate::notify::Notifier;

use cancel::CancelToken;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FadePlan {
    pub from: Volume,
    pub to: Volume,
    pub step_delay: Duration,
}

impl FadePlan {
    pub fn new(from: Volume, to: Volume, step_delay: Duration) -> Self {
        Self {
            from,
            to,
            step_delay,
        }
    }

    fn direction(&self) -> &'static str {
        if self.to >= self.from { "in" } else { "out" }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FadeOutcome {
    /// Reached the target; carries the settled volume.
    Completed(Volume),
    /// Stopped early; carries the last volume written, if any.
    Cancelled(Option<Volume>),
}

#[derive(Debug, Default)]
struct Completion {
    outcome: Mutex<Option<FadeOutcome>>,
    cv: Condvar,
}

impl Completion {
    fn finish(&self, outcome: FadeOutcome) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.cv.notify_all();
    }
}

/// Cheap handle to one ramp.
#[derive(Debug, Clone)]
pub struct FadeHandle {
    generation: u64,
    token: CancelToken,
    done: Arc<Completion>,
}

impl FadeHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ask the ramp to stop. It does not snap to its target.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.done
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Block until the ramp completes or acknowledges cancellation.
    pub fn wait(&self) -> FadeOutcome {
        let mut outcome = self
            .done
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(o) = *outcome {
                return o;
            }
            outcome = self
                .done
                .cv
                .wait(outcome)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct ActiveFade {
    handle: FadeHandle,
    join: Option<JoinHandle<()>>,
}

impl ActiveFade {
    fn stop(mut self) -> FadeOutcome {
        self.handle.cancel();
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
        self.handle.wait()
    }
}

pub struct FadeController {
    active: Mutex<Option<ActiveFade>>,
    generation: AtomicU64,
    /// Generation of the ramp currently writing, 0 when idle.
    running: Arc<AtomicU64>,
    /// Last volume written by a ramp or by [`FadeController::set_level`].
    level: Arc<AtomicU8>,
}

impl FadeController {
    pub fn new(initial_level: Volume) -> Self {
        Self {
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
            running: Arc::new(AtomicU64::new(0)),
            level: Arc::new(AtomicU8::new(initial_level)),
        }
    }

    pub fn level(&self) -> Volume {
        self.level.load(Ordering::SeqCst)
    }

    /// Record a volume written outside of a ramp.
    pub fn set_level(&self, volume: Volume) {
        self.level.store(volume, Ordering::SeqCst);
    }

    /// Lock-free, so ports may call it from inside a volume tick.
    pub fn is_fading(&self) -> bool {
        self.running.load(Ordering::SeqCst) != 0
    }

    /// Cancel the running ramp, if any, and wait for it to stop.
    pub fn cancel_active(&self) -> Option<FadeOutcome> {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        previous.map(|p| {
            let outcome = p.stop();
            debug!(?outcome, "fade stopped");
            outcome
        })
    }

    /// Start a ramp, replacing (and first stopping) any ramp in flight.
    ///
    /// Must not be called while holding the backend lock.
    pub fn start(
        &self,
        plan: FadePlan,
        backend: &SharedBackend,
        notifier: &Arc<Notifier>,
    ) -> FadeHandle {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.take() {
            let outcome = previous.stop();
            debug!(?outcome, "fade superseded");
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = FadeHandle {
            generation,
            token: CancelToken::default(),
            done: Arc::new(Completion::default()),
        };
        debug!(generation, from = plan.from, to = plan.to, delay = ?plan.step_delay, "fade start");
        self.running.store(generation, Ordering::SeqCst);

        let worker = Worker {
            plan,
            handle: handle.clone(),
            backend: backend.clone(),
            notifier: notifier.clone(),
            level: self.level.clone(),
            running: self.running.clone(),
        };
        let fallback = worker.clone();
        let join = match thread::Builder::new()
            .name(format!("bgplayer-fade-{generation}"))
            .spawn(move || worker.run())
        {
            Ok(j) => Some(j),
            Err(e) => {
                warn!(error = %e, "cannot spawn fade thread, fading inline");
                fallback.run();
                None
            }
        };

        *active = Some(ActiveFade {
            handle: handle.clone(),
            join,
        });
        handle
    }

    /// Start a ramp and block until it ends.
    pub fn run(
        &self,
        plan: FadePlan,
        backend: &SharedBackend,
        notifier: &Arc<Notifier>,
    ) -> FadeOutcome {
        self.start(plan, backend, notifier).wait()
    }
}

#[derive(Clone)]
struct Worker {
    plan: FadePlan,
    handle: FadeHandle,
    backend: SharedBackend,
    notifier: Arc<Notifier>,
    level: Arc<AtomicU8>,
    running: Arc<AtomicU64>,
}

impl Worker {
    fn run(self) {
        let outcome = self.ramp();
        let _ = self.running.compare_exchange(
            self.handle.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.notifier.fade(false);
        match outcome {
            FadeOutcome::Completed(v) => self.notifier.status(format!("Vol: {v}")),
            FadeOutcome::Cancelled(last) => {
                debug!(generation = self.handle.generation, ?last, "fade cancelled");
            }
        }
        self.handle.done.finish(outcome);
    }

    fn ramp(&self) -> FadeOutcome {
        let plan = self.plan;
        let token = &self.handle.token;
        let direction = plan.direction();
        let mut last = None;

        self.notifier.fade(true);
        for v in ramp(plan.from, plan.to) {
            if token.is_cancelled() {
                return FadeOutcome::Cancelled(last);
            }
            self.backend.with(|b| b.set_volume(v));
            self.level.store(v, Ordering::SeqCst);
            last = Some(v);
            self.notifier.volume_tick(v);
            self.notifier.status(format!("Fading {direction}... Vol: {v}"));

            if v != plan.to && token.sleep(plan.step_delay) {
                return FadeOutcome::Cancelled(last);
            }
        }
        FadeOutcome::Completed(plan.to)
    }
}
