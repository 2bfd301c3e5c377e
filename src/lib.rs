//! Background music panel core.
//!
//! A [`PlaybackSession`] plays tracks from a directory-backed [`Playlist`]
//! through a [`MediaBackend`], fading the volume in and out on transitions and
//! on pause/resume. Everything it does is reported through a
//! [`NotificationPort`], which may be a terminal panel, a log, or nothing.

pub mod backend;
pub mod config;
pub mod error;
pub mod fade;
pub mod library;
pub mod logging;
pub mod notify;
pub mod session;

pub use backend::{BackendState, MediaBackend, RodioBackend, SharedBackend, Volume};
pub use error::{PlayerError, Result};
pub use library::{Playlist, Track, TrackStatus};
pub use notify::{ChannelPort, NotificationPort, NullPort, TracingPort, UiEvent};
pub use session::{PlaybackSession, SessionConfig, SessionSnapshot, SessionState, TrackSelection};
