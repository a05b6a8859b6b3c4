//! The current playlist: the single mutable tracklist playback draws from.
//!
//! The cursor is keyed by track id, not index, so reordering keeps it on
//! the same logical track and removing that track clears it. Ids are
//! assigned monotonically when tracks are added.

use crate::error::{Error, Result};
use crate::models::Track;
use crate::playback::CoreHandle;

/// Mutable tracklist plus cursor. Pure data; locking lives in the
/// controller handle below.
#[derive(Debug, Default)]
pub struct CurrentPlaylist {
    tracks: Vec<Track>,
    next_id: u64,
    cursor: Option<u64>,
}

impl CurrentPlaylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Append a track, assigning a fresh id if it has none. Returns a
    /// reference to the stored track (with its id set).
    pub fn add(&mut self, mut track: Track) -> &Track {
        match track.id {
            // A unique caller id is kept; assignment stays monotonic past it.
            Some(id) if self.get_by_id(id).is_none() => {
                self.next_id = self.next_id.max(id.saturating_add(1));
            }
            // Unset or colliding ids get a fresh unique one, so the cursor
            // and `get_by_id` never have two tracks to choose from.
            _ => track.id = Some(self.fresh_id()),
        }
        self.tracks.push(track);
        &self.tracks[self.tracks.len() - 1]
    }

    fn fresh_id(&mut self) -> u64 {
        while self.get_by_id(self.next_id).is_some() {
            self.next_id = self.next_id.wrapping_add(1);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Remove the track with the given id. Clears the cursor if it pointed
    /// at the removed track.
    pub fn remove(&mut self, id: u64) -> Result<Track> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t.id == Some(id))
            .ok_or_else(|| Error::NotFound(format!("track id {id}")))?;
        if self.cursor == Some(id) {
            self.cursor = None;
        }
        Ok(self.tracks.remove(pos))
    }

    /// Move the track at `from` to position `to`. The cursor follows the
    /// logical track it pointed at.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return Err(Error::NotFound(format!("track index {}", from.max(to))));
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = None;
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == Some(id))
    }

    /// The track the cursor points at, if any.
    pub fn current(&self) -> Option<&Track> {
        let id = self.cursor?;
        self.get_by_id(id)
    }

    pub fn current_index(&self) -> Option<usize> {
        let id = self.cursor?;
        self.tracks.iter().position(|t| t.id == Some(id))
    }

    /// Point the cursor at the track with the given id. Fails if no such
    /// track exists, so the cursor can never dangle.
    pub fn set_current(&mut self, id: Option<u64>) -> Result<()> {
        if let Some(id) = id
            && self.get_by_id(id).is_none()
        {
            return Err(Error::NotFound(format!("track id {id}")));
        }
        self.cursor = id;
        Ok(())
    }

    /// The track after the cursor; the first track when the cursor is unset.
    pub fn peek_next(&self) -> Option<&Track> {
        match self.current_index() {
            Some(i) => self.tracks.get(i + 1),
            None => self.tracks.first(),
        }
    }

    /// The track before the cursor, if the cursor is set and not at the start.
    pub fn peek_previous(&self) -> Option<&Track> {
        match self.current_index() {
            Some(i) if i > 0 => self.tracks.get(i - 1),
            _ => None,
        }
    }
}

/// Client-facing handle; every operation takes the backend's single
/// serialization lock so playlist edits never race transport calls.
#[derive(Clone)]
pub struct CurrentPlaylistController {
    core: CoreHandle,
}

impl CurrentPlaylistController {
    pub(crate) fn new(core: CoreHandle) -> Self {
        Self { core }
    }

    /// Append a track and return it with its assigned id.
    pub fn add(&self, track: Track) -> Track {
        let mut core = crate::playback::lock(&self.core);
        core.tracklist.add(track).clone()
    }

    pub fn remove(&self, id: u64) -> Result<Track> {
        crate::playback::lock(&self.core).tracklist.remove(id)
    }

    pub fn move_track(&self, from: usize, to: usize) -> Result<()> {
        crate::playback::lock(&self.core)
            .tracklist
            .move_track(from, to)
    }

    pub fn clear(&self) {
        crate::playback::lock(&self.core).tracklist.clear();
    }

    pub fn get_by_id(&self, id: u64) -> Option<Track> {
        crate::playback::lock(&self.core)
            .tracklist
            .get_by_id(id)
            .cloned()
    }

    /// Snapshot of the tracklist in order.
    pub fn tracks(&self) -> Vec<Track> {
        crate::playback::lock(&self.core).tracklist.tracks().to_vec()
    }

    pub fn current_track(&self) -> Option<Track> {
        crate::playback::lock(&self.core).tracklist.current().cloned()
    }
}
