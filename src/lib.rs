//! Backend core for a pluggable music server.
//!
//! The crate owns the playback state machine, the current playlist, the
//! stored-playlist folder and the read-only library index. It does not
//! decode audio and it does not speak any client protocol: the embedder
//! injects an [`engine::AudioEngine`] and [`engine::Mixer`], feeds engine
//! events into [`playback::EngineEventSink`], and serves clients through
//! the controllers handed out by [`backend::Backend`].

pub mod backend;
pub mod config;
pub mod current;
pub mod engine;
pub mod error;
pub mod library;
pub mod models;
pub mod playback;
pub mod playlists;

pub use backend::Backend;
pub use config::Settings;
pub use error::{Error, Result};
pub use models::{Playlist, Track};
