//! Opening and decoding a file into a paused `rodio` sink.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::{PlayerError, Result};

/// A freshly decoded, paused sink plus the media's total duration if known.
pub(super) struct PreparedSink {
    pub sink: Sink,
    pub duration: Option<Duration>,
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<PreparedSink> {
    let load_failed = |reason: String| PlayerError::MediaLoadFailed {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| load_failed(e.to_string()))?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| load_failed(e.to_string()))?;

    // Not every container reports its length; tag properties usually do.
    let duration = decoder.total_duration().or_else(|| {
        lofty::read_from_path(path)
            .ok()
            .map(|tagged| tagged.properties().duration())
    });

    // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(PreparedSink { sink, duration })
}
