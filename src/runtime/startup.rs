use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use tracing::{info, warn};

use bgplayer::backend::{RodioBackend, SharedBackend};
use bgplayer::config;
use bgplayer::notify::{ChannelPort, UiEvent};
use bgplayer::session::{PlaybackSession, SessionConfig};

/// Settings to start with, plus the reason when defaults had to stand in.
///
/// A missing or broken config file never keeps the panel from starting.
pub fn resolve_settings<E: Display>(
    loaded: Result<config::Settings, E>,
) -> (config::Settings, Option<String>) {
    let problem = match loaded {
        Ok(settings) => match settings.validate() {
            Ok(()) => return (settings, None),
            Err(msg) => format!("invalid config, using defaults: {msg}"),
        },
        Err(e) => format!("failed to load config, using defaults: {e}"),
    };
    (config::Settings::default(), Some(problem))
}

/// Open the audio output and build a session wired to a fresh channel port.
///
/// The playlist is loaded here; an unreadable directory leaves it empty and is
/// reported on the status line rather than aborting.
pub fn open_session(
    settings: &config::Settings,
    dir: &Path,
) -> bgplayer::Result<(PlaybackSession, Receiver<UiEvent>)> {
    let backend = RodioBackend::open()?;
    let session = PlaybackSession::new(
        SharedBackend::new(backend),
        SessionConfig::from(&settings.audio),
        settings.library.clone(),
    );

    let events = attach_channel(&session);
    match session.load_playlist(dir) {
        Ok(n) => info!(tracks = n, dir = %dir.display(), "library loaded"),
        Err(e) => warn!(error = %e, "starting with an empty playlist"),
    }
    Ok((session, events))
}

/// Point the session at a new channel port and return its receiving end.
pub fn attach_channel(session: &PlaybackSession) -> Receiver<UiEvent> {
    let (port, events) = ChannelPort::new();
    session.attach_port(Arc::new(port));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_settings_are_kept() {
        let mut settings = config::Settings::default();
        settings.audio.volume = 42;
        let (resolved, problem) = resolve_settings::<String>(Ok(settings));
        assert_eq!(resolved.audio.volume, 42);
        assert!(problem.is_none());
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults() {
        let mut settings = config::Settings::default();
        settings.audio.poll_interval_ms = 0;
        let (resolved, problem) = resolve_settings::<String>(Ok(settings));
        let defaults = config::Settings::default();
        assert_eq!(resolved.audio.poll_interval_ms, defaults.audio.poll_interval_ms);
        assert!(problem.is_some_and(|p| p.contains("poll_interval_ms")));
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let (resolved, problem) = resolve_settings(Err("expected `=`"));
        assert!(resolved.validate().is_ok());
        assert_eq!(
            problem.as_deref(),
            Some("failed to load config, using defaults: expected `=`")
        );
    }
}
