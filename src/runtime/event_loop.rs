use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use bgplayer::config;
use bgplayer::notify::{TracingPort, UiEvent};
use bgplayer::session::{PlaybackSession, SessionState, TrackSelection};

use crate::app::Panel;
use crate::runtime::startup::attach_channel;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Receiving end of the session's channel port; `None` while hidden.
    pub events: Option<Receiver<UiEvent>>,
    last_tick: Instant,
    /// Background shutdown (fade-out + stop) started by `q`.
    quitting: Option<JoinHandle<()>>,
    stopped: bool,
}

impl EventLoopState {
    pub fn new(events: Receiver<UiEvent>) -> Self {
        Self {
            events: Some(events),
            last_tick: Instant::now(),
            quitting: None,
            stopped: false,
        }
    }
}

/// Main terminal event loop: drains session events, drives the tick timer,
/// draws and handles input. Returns `Ok(())` once shutdown has finished.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    panel: &mut Panel,
    session: &PlaybackSession,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if let Some(events) = &state.events {
            while let Ok(ev) = events.try_recv() {
                panel.apply(ev);
            }
        }

        if state.last_tick.elapsed() >= settings.ui.tick_interval() {
            state.last_tick = Instant::now();
            session.tick();
        }

        terminal.draw(|f| ui::draw(f, panel, &settings.ui))?;

        if state.stopped {
            return Ok(());
        }
        if let Some(handle) = &state.quitting {
            if handle.is_finished() {
                if let Some(handle) = state.quitting.take() {
                    let _ = handle.join();
                }
                return Ok(());
            }
            thread::sleep(Duration::from_millis(20));
            continue;
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                handle_key_event(key, settings, panel, session, state);
            }
        }
    }
}

fn start_shutdown(session: &PlaybackSession, state: &mut EventLoopState) {
    let worker = session.clone();
    match thread::Builder::new()
        .name("bgplayer-shutdown".to_string())
        .spawn(move || worker.shutdown())
    {
        Ok(handle) => state.quitting = Some(handle),
        Err(e) => {
            warn!(error = %e, "cannot spawn shutdown worker, stopping inline");
            session.shutdown();
            state.stopped = true;
        }
    }
}

fn toggle_output(panel: &mut Panel, session: &PlaybackSession, state: &mut EventLoopState) {
    if panel.hidden {
        state.events = Some(attach_channel(session));
        panel.hidden = false;
        debug!("panel output shown");
    } else {
        // Updates keep flowing to the log while the panel is hidden.
        session.attach_port(Arc::new(TracingPort));
        state.events = None;
        panel.hidden = true;
        debug!("panel output hidden");
    }
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    panel: &mut Panel,
    session: &PlaybackSession,
    state: &mut EventLoopState,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        start_shutdown(session, state);
        return;
    }

    match key.code {
        KeyCode::Char('q') => start_shutdown(session, state),
        KeyCode::Char('j') | KeyCode::Down => panel.next(),
        KeyCode::Char('k') | KeyCode::Up => panel.prev(),
        KeyCode::Enter => {
            if panel.has_tracks() {
                let _ = session.skip_async(TrackSelection::Explicit(panel.selected));
            }
        }
        KeyCode::Char('n') => {
            let _ = session.skip_async(TrackSelection::Next);
        }
        KeyCode::Char(' ') => match session.state() {
            SessionState::Playing => {
                session.pause_async(true);
            }
            SessionState::Paused => {
                session.pause_async(false);
            }
            SessionState::Idle | SessionState::Ended => {
                if panel.has_tracks() {
                    let _ = session.skip_async(TrackSelection::Explicit(panel.selected));
                }
            }
            SessionState::Loading => {}
        },
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let step = settings.ui.volume_step;
            session.set_volume(session.volume().saturating_add(step));
        }
        KeyCode::Char('-') => {
            let step = settings.ui.volume_step;
            session.set_volume(session.volume().saturating_sub(step));
        }
        KeyCode::Char('f') => session.set_fade_enabled(!session.fade_enabled()),
        KeyCode::Char('u') => {
            if let Some(target) = panel.end_scrub() {
                let _ = session.seek(target);
            } else if panel.begin_scrub() {
                session.begin_seek();
            }
        }
        KeyCode::Char('h') => panel.scrub(-(settings.ui.scrub_seconds as i64)),
        KeyCode::Char('l') => panel.scrub(settings.ui.scrub_seconds as i64),
        KeyCode::Char('w') => toggle_output(panel, session, state),
        _ => {}
    }
}
