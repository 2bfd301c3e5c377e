//! Commands and shared state of the rodio audio thread.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::backend::types::{BackendState, Volume};
use crate::error::Result;

#[derive(Debug)]
pub(crate) enum AudioCmd {
    /// Replace the current media; the reply carries decode/open failures.
    Load {
        path: PathBuf,
        reply: Sender<Result<()>>,
    },
    /// Start (or restart) the loaded media.
    Play,
    SetPause(bool),
    Stop,
    SetVolume(Volume),
    SetMute(bool),
    Seek {
        position: Duration,
        reply: Sender<Result<()>>,
    },
    /// Leave the audio thread.
    Quit,
}

/// Playback information published by the audio thread.
#[derive(Debug, Clone)]
pub(crate) struct OutputInfo {
    pub state: BackendState,
    pub loaded: bool,
    /// Volume the thread has actually applied to the sink.
    pub volume: Volume,
    pub muted: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
}

impl Default for OutputInfo {
    fn default() -> Self {
        Self {
            state: BackendState::Idle,
            loaded: false,
            volume: 0,
            muted: false,
            position: Duration::ZERO,
            duration: None,
        }
    }
}

pub(crate) type InfoHandle = Arc<Mutex<OutputInfo>>;

/// Sink gain for a backend volume; 100 maps to unity.
pub(crate) fn gain(volume: Volume, muted: bool) -> f32 {
    if muted { 0.0 } else { f32::from(volume) / 100.0 }
}

/// Track position across sink rebuilds.
///
/// A rebuilt sink starts counting from zero even though its source skipped
/// into the file, so the skipped part is kept as an offset.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PositionClock {
    offset: Duration,
}

impl PositionClock {
    /// The sink now plays from the top of the file.
    pub fn reset(&mut self) {
        self.offset = Duration::ZERO;
    }

    /// The sink was rebuilt with its source skipped to `at`.
    pub fn rebase(&mut self, at: Duration) {
        self.offset = at;
    }

    pub fn position(&self, sink_pos: Duration) -> Duration {
        self.offset + sink_pos
    }
}

/// Fixed-cadence trigger that fires no matter how busy the command queue is.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefreshTimer {
    every: Duration,
    last: Instant,
}

impl RefreshTimer {
    pub fn new(every: Duration, now: Instant) -> Self {
        Self { every, last: now }
    }

    /// Time left until the next refresh is due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.every.saturating_sub(now.saturating_duration_since(self.last))
    }

    /// True (and restarts the period) once `every` has passed since the last refresh.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.every {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_maps_percent_and_mute() {
        assert_eq!(gain(100, false), 1.0);
        assert_eq!(gain(150, false), 1.5);
        assert_eq!(gain(0, false), 0.0);
        assert_eq!(gain(80, true), 0.0);
    }

    #[test]
    fn position_survives_a_rebuilt_sink() {
        let mut clock = PositionClock::default();
        assert_eq!(clock.position(Duration::from_secs(3)), Duration::from_secs(3));

        clock.rebase(Duration::from_secs(90));
        assert_eq!(clock.position(Duration::ZERO), Duration::from_secs(90));
        assert_eq!(clock.position(Duration::from_millis(1500)), Duration::from_millis(91_500));

        clock.reset();
        assert_eq!(clock.position(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[test]
    fn refresh_fires_under_a_steady_command_stream() {
        let start = Instant::now();
        let every = Duration::from_millis(100);
        let mut timer = RefreshTimer::new(every, start);

        // A command every 10 ms never lets a 100 ms receive time out.
        let fired: Vec<u64> = (1..=35u64)
            .map(|i| i * 10)
            .filter(|&ms| timer.due(start + Duration::from_millis(ms)))
            .collect();
        assert_eq!(fired, vec![100, 200, 300]);
        assert_eq!(
            timer.remaining(start + Duration::from_millis(350)),
            Duration::from_millis(50)
        );
    }
}
