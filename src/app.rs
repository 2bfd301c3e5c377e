//! Application module: the panel model drawn by the TUI.
//!
//! `Panel` mirrors what the playback session has published so far. It is only
//! ever mutated on the UI thread, from events drained off the session's port.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
