use std::fs;
use std::io;
use std::path::Path;

use lofty::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::{PlayerError, Result};

use super::model::{Playlist, Track};

fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

pub(super) fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Build a playlist from the audio files directly inside `dir`.
///
/// Entries are sorted by file name and titled by their stem. Subdirectories
/// are not visited. An unreadable or missing directory is an error; unreadable
/// individual entries are skipped.
pub fn load(dir: &Path, settings: &LibrarySettings) -> Result<Playlist> {
    let unreadable = |source: io::Error| PlayerError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let meta = fs::metadata(dir).map_err(unreadable)?;
    if !meta.is_dir() {
        return Err(unreadable(io::Error::other("not a directory")));
    }
    // Listing permission is only checked by actually opening the directory.
    fs::read_dir(dir).map_err(unreadable)?;

    let extensions = normalized_extensions(settings);
    let mut tracks: Vec<Track> = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable playlist entry");
                None
            }
        })
    {
        let path = entry.path();
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, &extensions)
        {
            continue;
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        let mut track = Track::new(path.to_path_buf(), title);
        // Tag parsing is best-effort; the backend reports duration too.
        if let Ok(tagged) = lofty::read_from_path(path) {
            track.duration = Some(tagged.properties().duration());
        }
        tracks.push(track);
    }

    debug!(dir = %dir.display(), tracks = tracks.len(), "playlist scanned");
    Ok(Playlist::new(tracks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let exts = normalized_extensions(&LibrarySettings::default());
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &exts));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &exts));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &exts));
        assert!(is_audio_file(Path::new("/tmp/a.wav"), &exts));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &exts));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &exts));
        assert!(!is_audio_file(Path::new("/tmp/a"), &exts));
    }

    #[test]
    fn normalized_extensions_strip_dots_and_blanks() {
        let settings = LibrarySettings {
            extensions: vec![".MP3".into(), "  ".into(), " ogg ".into()],
            ..LibrarySettings::default()
        };
        assert_eq!(normalized_extensions(&settings), vec!["mp3", "ogg"]);
    }

    #[test]
    fn load_filters_non_audio_and_sorts_by_file_name() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("b.mp3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("a.ogg"), b"not a real ogg").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

        let playlist = load(dir.path(), &LibrarySettings::default()).unwrap();
        let titles: Vec<&str> = playlist.tracks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(playlist.tracks()[1].path, dir.path().join("b.mp3"));
    }

    #[test]
    fn load_does_not_recurse() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("child.mp3"), b"not real").unwrap();

        let playlist = load(dir.path(), &LibrarySettings::default()).unwrap();
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.tracks()[0].title, "root");
    }

    #[test]
    fn load_skips_hidden_files_unless_enabled() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

        let playlist = load(dir.path(), &LibrarySettings::default()).unwrap();
        assert_eq!(playlist.len(), 1);

        let settings = LibrarySettings {
            include_hidden: true,
            ..LibrarySettings::default()
        };
        assert_eq!(load(dir.path(), &settings).unwrap().len(), 2);
    }

    #[test]
    fn load_strips_only_the_last_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("live.at.home.flac"), b"not real").unwrap();

        let playlist = load(dir.path(), &LibrarySettings::default()).unwrap();
        assert_eq!(playlist.tracks()[0].title, "live.at.home");
    }

    #[test]
    fn load_missing_directory_is_unreadable() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = load(&missing, &LibrarySettings::default()).unwrap_err();
        assert!(matches!(err, PlayerError::DirectoryUnreadable { ref path, .. } if *path == missing));
    }

    #[test]
    fn load_file_instead_of_directory_is_unreadable() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"not real").unwrap();

        let err = load(&file, &LibrarySettings::default()).unwrap_err();
        assert!(matches!(err, PlayerError::DirectoryUnreadable { .. }));
    }
}
