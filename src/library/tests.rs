use super::{Playlist, Track, TrackStatus};
use std::path::PathBuf;

fn t(name: &str) -> Track {
    Track::new(PathBuf::from(format!("/music/{name}.mp3")), name.into())
}

#[test]
fn playlist_drops_duplicate_paths() {
    let playlist = Playlist::new(vec![t("a"), t("b"), t("a")]);
    assert_eq!(playlist.len(), 2);
    assert_eq!(playlist.tracks()[0].title, "a");
    assert_eq!(playlist.tracks()[1].title, "b");
}

#[test]
fn new_tracks_start_never_played() {
    let playlist = Playlist::new(vec![t("a")]);
    assert_eq!(playlist.tracks()[0].status(), TrackStatus::NeverPlayed);
}

#[test]
fn status_follows_play_then_finish_or_skip() {
    let mut playlist = Playlist::new(vec![t("a"), t("b")]);

    assert!(playlist.set_status(0, TrackStatus::PlayingNow));
    assert!(playlist.set_status(0, TrackStatus::Skipped));
    // Cannot finish a track that was already skipped.
    assert!(!playlist.set_status(0, TrackStatus::PlayedToEnd));
    assert_eq!(playlist.tracks()[0].status(), TrackStatus::Skipped);

    assert!(!playlist.set_status(1, TrackStatus::PlayedToEnd));
    assert!(playlist.set_status(1, TrackStatus::PlayingNow));
    assert!(playlist.set_status(1, TrackStatus::PlayedToEnd));
}

#[test]
fn status_never_reverts_to_never_played() {
    let mut playlist = Playlist::new(vec![t("a")]);
    playlist.set_status(0, TrackStatus::PlayingNow);
    assert!(!playlist.set_status(0, TrackStatus::NeverPlayed));
    assert!(!playlist.set_status(0, TrackStatus::PlayingNow));
}

#[test]
fn set_status_out_of_range_is_ignored() {
    let mut playlist = Playlist::new(vec![t("a")]);
    assert!(!playlist.set_status(5, TrackStatus::PlayingNow));
}
