use std::env;
use std::path::PathBuf;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use bgplayer::{config, logging};

use crate::app::Panel;

mod event_loop;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (settings, settings_problem) = startup::resolve_settings(config::Settings::load());
    if let Some(problem) = &settings_problem {
        eprintln!("bgplayer: {problem}");
    }

    if args.iter().any(|a| a == "--print-config") {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let dir = args
        .into_iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from("Music")));

    match logging::init(&settings.logging) {
        Ok(Some(path)) => info!(path = %path.display(), "logging started"),
        Ok(None) => {}
        Err(e) => eprintln!("bgplayer: logging disabled: {e}"),
    }
    if let Some(problem) = settings_problem {
        warn!("{problem}");
    }

    let (session, events) = startup::open_session(&settings, &dir)?;
    let mut panel = Panel::new(dir.display().to_string());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(events);
        event_loop::run(&mut terminal, &settings, &mut panel, &session, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
