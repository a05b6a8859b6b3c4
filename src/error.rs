//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No advertised URI handler matches the track's scheme.
    #[error("no URI handler for: {0}")]
    UnplayableTrack(String),

    /// The audio engine reported a failure during active playback.
    #[error("playback failed: {0}")]
    Playback(String),

    /// Transport call not valid in the current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Stored-playlist name collision on create/rename.
    #[error("playlist already exists: {0}")]
    DuplicateName(String),

    /// The targeted playlist/track does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem failure during a stored-playlist write, rename or delete.
    #[error("playlist storage failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// The tag cache could not be read or parsed. Fatal to backend
    /// construction: the library index would otherwise be silently wrong.
    #[error("tag cache {path}: {reason}")]
    TagCache { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
