use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Playback history of a track, also used to color it in the panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TrackStatus {
    #[default]
    NeverPlayed,
    PlayingNow,
    PlayedToEnd,
    Skipped,
}

impl TrackStatus {
    /// Whether `self -> next` is a legal transition.
    ///
    /// Any track may start playing again (a fresh selection), but only a
    /// playing track can finish or be skipped.
    pub fn can_become(self, next: TrackStatus) -> bool {
        match next {
            TrackStatus::PlayingNow => self != TrackStatus::PlayingNow,
            TrackStatus::PlayedToEnd | TrackStatus::Skipped => self == TrackStatus::PlayingNow,
            TrackStatus::NeverPlayed => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrackStatus::NeverPlayed => "never played",
            TrackStatus::PlayingNow => "playing",
            TrackStatus::PlayedToEnd => "played",
            TrackStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub duration: Option<Duration>,
    pub(crate) status: TrackStatus,
}

impl Track {
    pub fn new(path: PathBuf, title: String) -> Self {
        Self {
            path,
            title,
            duration: None,
            status: TrackStatus::NeverPlayed,
        }
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }
}

/// Ordered tracks, unique by path.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    /// Build a playlist, dropping later duplicates of an already-seen path.
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut seen = HashSet::new();
        let tracks = tracks
            .into_iter()
            .filter(|t| seen.insert(t.path.clone()))
            .collect();
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Move the track at `index` to `status` if the transition is legal.
    ///
    /// Returns `true` when the status actually changed.
    pub(crate) fn set_status(&mut self, index: usize, status: TrackStatus) -> bool {
        match self.tracks.get_mut(index) {
            Some(track) if track.status.can_become(status) => {
                track.status = status;
                true
            }
            _ => false,
        }
    }
}
