//! Value types shared by all controllers: `Track` and `Playlist`.

use std::time::SystemTime;

/// A playable item. Immutable once constructed; compared by value.
///
/// The `uri` is an opaque locator whose scheme decides which backend can
/// resolve it. The `id` is only meaningful inside a current-playlist
/// context and is (re)assigned when the track is added there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub uri: String,
    pub id: Option<u64>,
    pub name: Option<String>,
    /// Duration in milliseconds, if known.
    pub length_ms: Option<u64>,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub track_no: Option<u32>,
}

impl Track {
    /// Create a track carrying only a `uri`, all metadata unknown.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            id: None,
            name: None,
            length_ms: None,
            artists: Vec::new(),
            album: None,
            track_no: None,
        }
    }

    /// The URI scheme (`file` for `file:///a.mp3`), if the URI has one.
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, rest) = self.uri.split_once(':')?;
        if scheme.is_empty() || rest.is_empty() {
            return None;
        }
        Some(scheme)
    }
}

/// An ordered collection of tracks with a name.
///
/// `uri` identifies the persisted form and stays `None` until the playlist
/// is first saved by the stored-playlists controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub name: String,
    pub uri: Option<String>,
    pub tracks: Vec<Track>,
    pub last_modified: Option<SystemTime>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: None,
            tracks: Vec::new(),
            last_modified: None,
        }
    }

    pub fn with_tracks(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            uri: None,
            tracks,
            last_modified: None,
        }
    }
}
