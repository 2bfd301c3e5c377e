//! Configuration loader and schema types.
//!
//! The host application owns configuration; the playback core only ever sees
//! the plain values extracted from these structs.

mod load;
mod schema;

pub use load::{default_config_path, default_log_path, resolve_config_path};
pub use schema::*;
