use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::PoisonError;
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, info, warn};

use crate::backend::types::BackendState;
use crate::error::{PlayerError, Result};

use super::sink::create_sink_at;
use super::types::{AudioCmd, InfoHandle, OutputInfo, PositionClock, RefreshTimer, gain};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// State owned by the audio thread. Only this thread touches the sink.
struct AudioThread {
    stream: OutputStream,
    info: InfoHandle,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    volume: u8,
    muted: bool,
    clock: PositionClock,
}

impl AudioThread {
    fn publish(&self, f: impl FnOnce(&mut OutputInfo)) {
        let mut info = self.info.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut info);
    }

    fn apply_gain(&self) {
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(gain(self.volume, self.muted));
        }
        let (volume, muted) = (self.volume, self.muted);
        self.publish(|info| {
            info.volume = volume;
            info.muted = muted;
        });
    }

    fn load(&mut self, path: PathBuf) -> Result<()> {
        if let Some(s) = self.sink.take() {
            s.stop();
        }

        match create_sink_at(&self.stream, &path, Duration::ZERO) {
            Ok(prepared) => {
                prepared.sink.set_volume(gain(self.volume, self.muted));
                self.sink = Some(prepared.sink);
                self.path = Some(path);
                self.clock.reset();
                self.publish(|info| {
                    info.state = BackendState::Stopped;
                    info.loaded = true;
                    info.position = Duration::ZERO;
                    info.duration = prepared.duration;
                });
                Ok(())
            }
            Err(e) => {
                self.path = None;
                self.publish(|info| {
                    info.state = BackendState::Error;
                    info.loaded = false;
                    info.duration = None;
                });
                Err(e)
            }
        }
    }

    fn play(&mut self) {
        let Some(s) = self.sink.as_ref() else {
            self.publish(|info| info.state = BackendState::Error);
            return;
        };
        s.set_volume(gain(self.volume, self.muted));
        s.play();
        self.publish(|info| info.state = BackendState::Playing);
    }

    fn set_pause(&mut self, paused: bool) {
        let Some(s) = self.sink.as_ref() else {
            return;
        };
        if paused {
            s.pause();
            self.publish(|info| info.state = BackendState::Paused);
        } else {
            s.play();
            self.publish(|info| info.state = BackendState::Playing);
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.stop();
        }
        // Keep the path so `play()` after `stop()` restarts from the top.
        self.sink = None;
        let reloaded = self
            .path
            .clone()
            .map(|p| create_sink_at(&self.stream, &p, Duration::ZERO));
        let loaded = matches!(reloaded, Some(Ok(_)));
        if let Some(Ok(prepared)) = reloaded {
            self.sink = Some(prepared.sink);
        }
        self.clock.reset();
        self.publish(|info| {
            info.state = BackendState::Stopped;
            info.loaded = loaded;
            info.position = Duration::ZERO;
        });
    }

    /// Seek in place, or rebuild the sink at `position` when the decoder cannot seek.
    fn seek(&mut self, position: Duration) -> Result<()> {
        let (Some(s), Some(path)) = (self.sink.as_ref(), self.path.clone()) else {
            return Err(PlayerError::SeekFailed("no media loaded".to_string()));
        };

        match s.try_seek(position) {
            Ok(()) => self.clock.reset(),
            Err(e) => {
                debug!(error = %e, "in-place seek unsupported, rebuilding sink");
                let was_paused = s.is_paused();
                s.stop();
                let prepared = create_sink_at(&self.stream, &path, position)
                    .map_err(|e| PlayerError::SeekFailed(e.to_string()))?;
                prepared.sink.set_volume(gain(self.volume, self.muted));
                if !was_paused {
                    prepared.sink.play();
                }
                self.sink = Some(prepared.sink);
                self.clock.rebase(position);
            }
        }

        self.publish(|info| info.position = position);
        Ok(())
    }

    /// Periodic refresh of position and end-of-media detection.
    fn refresh(&mut self) {
        let Some(s) = self.sink.as_ref() else {
            return;
        };
        let pos = self.clock.position(s.get_pos());
        let drained = s.empty();
        self.publish(|info| {
            info.position = pos;
            if drained && info.state == BackendState::Playing {
                info.state = BackendState::Ended;
            }
        });
    }
}

/// Spawn the thread owning the output stream.
///
/// `ready` receives the outcome of opening the default output device; on
/// failure the thread exits right away.
pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    info: InfoHandle,
    ready: Sender<Result<()>>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("bgplayer-audio".to_string())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "no audio output device");
                    let _ = ready.send(Err(PlayerError::AudioOutput(e.to_string())));
                    return;
                }
            };
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);
            let _ = ready.send(Ok(()));
            info!("audio output opened");

            let mut audio = AudioThread {
                stream,
                info,
                sink: None,
                path: None,
                volume: 0,
                muted: false,
                clock: PositionClock::default(),
            };

            // Refresh on a fixed cadence; a fade sends commands faster than
            // POLL_INTERVAL and would otherwise never let the receive time out.
            let mut refresh = RefreshTimer::new(POLL_INTERVAL, Instant::now());
            loop {
                match rx.recv_timeout(refresh.remaining(Instant::now())) {
                    Ok(cmd) => match cmd {
                        AudioCmd::Load { path, reply } => {
                            let result = audio.load(path);
                            if let Err(e) = &result {
                                warn!(error = %e, "load failed");
                            }
                            let _ = reply.send(result);
                        }
                        AudioCmd::Play => audio.play(),
                        AudioCmd::SetPause(paused) => audio.set_pause(paused),
                        AudioCmd::Stop => audio.stop(),
                        AudioCmd::SetVolume(v) => {
                            audio.volume = v;
                            audio.apply_gain();
                        }
                        AudioCmd::SetMute(m) => {
                            audio.muted = m;
                            audio.apply_gain();
                        }
                        AudioCmd::Seek { position, reply } => {
                            let _ = reply.send(audio.seek(position));
                        }
                        AudioCmd::Quit => {
                            if let Some(s) = audio.sink.take() {
                                s.stop();
                            }
                            audio.publish(|info| info.state = BackendState::Stopped);
                            break;
                        }
                    },
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                if refresh.due(Instant::now()) {
                    audio.refresh();
                }
            }
            debug!("audio thread exiting");
        })
}
