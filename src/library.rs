//! Playlist store: track records and the directory scanner that builds them.

mod model;
mod scan;

pub use model::{Playlist, Track, TrackStatus};
pub use scan::load;

#[cfg(test)]
mod tests;
