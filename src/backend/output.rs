//! [`MediaBackend`] implementation on top of `rodio`.
//!
//! The output stream and sink live on a dedicated audio thread; this handle
//! only sends commands and reads the state the thread publishes. Writes are
//! therefore visible a little later than they are issued, which is exactly
//! the asynchrony [`SharedBackend`](super::SharedBackend) waits out.

mod sink;
mod thread;
mod types;

use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{PlayerError, Result};

use super::MediaBackend;
use super::types::{BackendState, MAX_VOLUME, Volume};
use thread::spawn_audio_thread;
use types::{AudioCmd, InfoHandle, OutputInfo};

pub struct RodioBackend {
    tx: Sender<AudioCmd>,
    info: InfoHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioBackend {
    /// Open the default output device on a new audio thread.
    pub fn open() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let info: InfoHandle = Arc::new(Mutex::new(OutputInfo::default()));

        let join = spawn_audio_thread(rx, info.clone(), ready_tx)
            .map_err(|e| PlayerError::AudioOutput(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| PlayerError::AudioOutput("audio thread exited".to_string()))??;

        Ok(Self {
            tx,
            info,
            join: Mutex::new(Some(join)),
        })
    }

    fn send(&self, cmd: AudioCmd) {
        // A dead audio thread shows up as an unchanged (or Error) state.
        let _ = self.tx.send(cmd);
    }

    fn read<R>(&self, f: impl FnOnce(&OutputInfo) -> R) -> R {
        let info = self.info.lock().unwrap_or_else(PoisonError::into_inner);
        f(&info)
    }

    fn request(&self, make: impl FnOnce(Sender<Result<()>>) -> AudioCmd) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| PlayerError::AudioOutput("audio thread is gone".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| PlayerError::AudioOutput("audio thread is gone".to_string()))?
    }
}

impl MediaBackend for RodioBackend {
    fn load(&mut self, path: &Path) -> Result<()> {
        let path = path.to_path_buf();
        self.request(|reply| AudioCmd::Load { path, reply })
    }

    fn play(&mut self) -> Result<()> {
        if !self.read(|i| i.loaded) {
            return Err(PlayerError::PlaybackFailed("no media loaded".to_string()));
        }
        {
            let mut info = self.info.lock().unwrap_or_else(PoisonError::into_inner);
            info.state = BackendState::Opening;
        }
        self.send(AudioCmd::Play);
        Ok(())
    }

    fn set_pause(&mut self, paused: bool) {
        self.send(AudioCmd::SetPause(paused));
    }

    fn stop(&mut self) {
        self.send(AudioCmd::Stop);
    }

    fn state(&self) -> BackendState {
        self.read(|i| i.state)
    }

    fn volume(&self) -> Volume {
        self.read(|i| i.volume)
    }

    fn set_volume(&mut self, volume: Volume) {
        self.send(AudioCmd::SetVolume(volume.min(MAX_VOLUME)));
    }

    fn is_muted(&self) -> bool {
        self.read(|i| i.muted)
    }

    fn set_mute(&mut self, muted: bool) {
        self.send(AudioCmd::SetMute(muted));
    }

    fn position(&self) -> Option<Duration> {
        self.read(|i| i.loaded.then_some(i.position))
    }

    fn duration(&self) -> Option<Duration> {
        self.read(|i| i.duration)
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.request(|reply| AudioCmd::Seek { position, reply })
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.tx.send(AudioCmd::Quit);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
