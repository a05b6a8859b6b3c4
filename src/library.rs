//! Read-only library index built from a precomputed tag-cache file.
//!
//! The cache is parsed exactly once, when the backend is constructed; the
//! resulting index is immutable and safe to read from any thread. Picking
//! up cache changes requires a fresh backend.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use log::info;
use url::Url;

use crate::error::{Error, Result};
use crate::models::Track;

mod tag_cache;

#[cfg(test)]
mod tests;

/// One row of a `browse` listing.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseEntry {
    /// A sub-directory, as a `/`-separated path relative to the music root.
    Directory(String),
    Track(Track),
}

#[derive(Debug, Default)]
struct DirNode {
    subdirs: BTreeSet<String>,
    tracks: Vec<usize>,
}

/// The immutable index: tracks in cache order plus a directory tree for
/// hierarchical browsing.
#[derive(Debug)]
pub struct Library {
    tracks: Vec<Track>,
    by_uri: HashMap<String, usize>,
    dirs: BTreeMap<String, DirNode>,
}

impl Library {
    /// Parse `tag_cache` scoped under `music_folder`. Any read or parse
    /// failure is fatal: a wrong index must never masquerade as a good one.
    pub fn open(tag_cache: &Path, music_folder: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(tag_cache).map_err(|err| Error::TagCache {
            path: tag_cache.to_path_buf(),
            reason: err.to_string(),
        })?;
        let parsed = tag_cache::parse(&contents).map_err(|reason| Error::TagCache {
            path: tag_cache.to_path_buf(),
            reason,
        })?;

        let music_folder = std::path::absolute(music_folder).map_err(|err| Error::TagCache {
            path: tag_cache.to_path_buf(),
            reason: format!("music folder: {err}"),
        })?;

        let mut library = Self {
            tracks: Vec::new(),
            by_uri: HashMap::new(),
            dirs: BTreeMap::new(),
        };
        library.dirs.entry(String::new()).or_default();
        for dir in &parsed.directories {
            library.register_dir(dir);
        }

        for song in parsed.songs {
            let uri =
                file_url(&music_folder.join(&song.path)).ok_or_else(|| Error::TagCache {
                    path: tag_cache.to_path_buf(),
                    reason: format!("unmappable file path: {}", song.path),
                })?;

            let parent = match song.path.rsplit_once('/') {
                Some((dir, _)) => {
                    library.register_dir(dir);
                    dir.to_string()
                }
                None => String::new(),
            };

            let index = library.tracks.len();
            library.by_uri.insert(uri.clone(), index);
            library.tracks.push(Track {
                uri,
                id: None,
                name: song.title,
                length_ms: song.time_s.map(|s| s * 1000),
                artists: song.artist.into_iter().collect(),
                album: song.album,
                track_no: song.track_no,
            });
            if let Some(node) = library.dirs.get_mut(&parent) {
                node.tracks.push(index);
            }
        }

        info!(
            "library: indexed {} track(s) under {}",
            library.tracks.len(),
            music_folder.display()
        );
        Ok(library)
    }

    /// Register `dir` and every ancestor, linking each into its parent.
    fn register_dir(&mut self, dir: &str) {
        if dir.is_empty() {
            return;
        }
        let (parent, _) = dir.rsplit_once('/').unwrap_or(("", dir));
        self.register_dir(parent);
        self.dirs.entry(dir.to_string()).or_default();
        if let Some(node) = self.dirs.get_mut(parent) {
            node.subdirs.insert(dir.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Exact URI lookup.
    pub fn lookup(&self, uri: &str) -> Result<Track> {
        self.by_uri
            .get(uri)
            .map(|&i| self.tracks[i].clone())
            .ok_or_else(|| Error::NotFound(uri.to_string()))
    }

    /// Case-insensitive substring match over name, artists, album and URI.
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<Track> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.tracks
            .iter()
            .filter(|t| {
                t.name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&query))
                    || t.artists.iter().any(|a| a.to_lowercase().contains(&query))
                    || t.album
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&query))
                    || t.uri.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// List the directory at `path` (empty string for the root):
    /// sub-directories first, then tracks in cache order.
    pub fn browse(&self, path: &str) -> Result<Vec<BrowseEntry>> {
        let path = path.trim_matches('/');
        let node = self
            .dirs
            .get(path)
            .ok_or_else(|| Error::NotFound(format!("directory {path:?}")))?;

        let mut entries: Vec<BrowseEntry> = node
            .subdirs
            .iter()
            .map(|d| BrowseEntry::Directory(d.clone()))
            .collect();
        entries.extend(
            node.tracks
                .iter()
                .map(|&i| BrowseEntry::Track(self.tracks[i].clone())),
        );
        Ok(entries)
    }
}

fn file_url(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(|u| u.to_string())
}

/// Cheap-to-clone read handle handed out by the backend.
#[derive(Clone)]
pub struct LibraryController {
    library: Arc<Library>,
}

impl LibraryController {
    pub(crate) fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    pub fn lookup(&self, uri: &str) -> Result<Track> {
        self.library.lookup(uri)
    }

    pub fn search(&self, query: &str) -> Vec<Track> {
        self.library.search(query)
    }

    pub fn browse(&self, path: &str) -> Result<Vec<BrowseEntry>> {
        self.library.browse(path)
    }

    pub fn len(&self) -> usize {
        self.library.len()
    }

    pub fn is_empty(&self) -> bool {
        self.library.is_empty()
    }
}
