use super::*;
use bgplayer::library::TrackStatus;
use bgplayer::notify::{Controls, TrackRow, UiEvent};
use bgplayer::session::{SessionSnapshot, SessionState};
use std::time::Duration;

fn row(title: &str) -> TrackRow {
    TrackRow {
        title: title.into(),
        status: TrackStatus::NeverPlayed,
    }
}

fn panel_with(titles: &[&str]) -> Panel {
    let mut panel = Panel::new("Music".into());
    panel.apply(UiEvent::Playlist(titles.iter().map(|t| row(t)).collect()));
    panel
}

#[test]
fn track_color_updates_matching_row_only() {
    let mut panel = panel_with(&["Alpha", "Beta"]);
    panel.apply(UiEvent::TrackColor {
        index: 1,
        status: TrackStatus::PlayingNow,
    });
    panel.apply(UiEvent::TrackColor {
        index: 7,
        status: TrackStatus::Skipped,
    });

    assert_eq!(panel.tracks[0].status, TrackStatus::NeverPlayed);
    assert_eq!(panel.tracks[1].status, TrackStatus::PlayingNow);
}

#[test]
fn selection_stays_within_playlist() {
    let mut panel = panel_with(&["A", "B", "C"]);
    panel.prev();
    assert_eq!(panel.selected, 0);
    panel.next();
    panel.next();
    panel.next();
    assert_eq!(panel.selected, 2);

    panel.apply(UiEvent::Playlist(vec![row("only")]));
    assert_eq!(panel.selected, 0);
}

#[test]
fn volume_label_follows_fade_activity() {
    let mut panel = panel_with(&["A"]);
    panel.apply(UiEvent::VolumeTick(40));
    assert_eq!(panel.volume_label(), "VOL: 40");

    panel.apply(UiEvent::Fade(true));
    panel.apply(UiEvent::VolumeTick(12));
    assert_eq!(panel.volume_label(), "FAD: 12");

    panel.apply(UiEvent::Fade(false));
    assert_eq!(panel.volume_label(), "VOL: 12");
}

#[test]
fn session_snapshot_drives_state_and_volume() {
    let mut panel = panel_with(&["A", "B"]);
    assert_eq!(panel.state(), SessionState::Idle);

    panel.apply(UiEvent::Session(SessionSnapshot {
        state: SessionState::Paused,
        volume: 70,
        track_index: Some(1),
        fade_enabled: true,
    }));
    assert_eq!(panel.state(), SessionState::Paused);
    assert_eq!(panel.volume, 70);
    assert_eq!(panel.now_playing(), Some(1));
}

#[test]
fn scrubbing_needs_the_lock_control() {
    let mut panel = panel_with(&["A"]);
    assert!(!panel.begin_scrub());

    panel.apply(UiEvent::Controls(Controls {
        play: true,
        pause: true,
        lock: true,
    }));
    panel.apply(UiEvent::Progress {
        position: Duration::from_secs(10),
        duration: Some(Duration::from_secs(20)),
    });
    assert!(panel.begin_scrub());

    panel.scrub(-15);
    assert_eq!(panel.shown_position(), Duration::ZERO);
    panel.scrub(30);
    assert_eq!(panel.shown_position(), Duration::from_secs(20));
    assert_eq!(panel.time_ratio(), 1.0);

    assert_eq!(panel.end_scrub(), Some(Duration::from_secs(20)));
    assert!(!panel.is_scrubbing());
    assert_eq!(panel.end_scrub(), None);
}

#[test]
fn losing_the_lock_control_drops_scrub() {
    let mut panel = panel_with(&["A"]);
    panel.apply(UiEvent::Controls(Controls {
        play: true,
        pause: true,
        lock: true,
    }));
    assert!(panel.begin_scrub());

    panel.apply(UiEvent::Controls(Controls {
        play: true,
        pause: false,
        lock: false,
    }));
    assert!(!panel.is_scrubbing());
}

#[test]
fn time_ratio_without_duration_is_empty() {
    let mut panel = panel_with(&["A"]);
    panel.apply(UiEvent::Progress {
        position: Duration::from_secs(3),
        duration: None,
    });
    assert_eq!(panel.time_ratio(), 0.0);
}
