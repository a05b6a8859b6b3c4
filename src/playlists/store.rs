use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use log::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::models::{Playlist, Track};

pub(crate) const PLAYLIST_EXT: &str = "m3u";

/// The in-memory mirror of the playlist folder.
pub(crate) struct Store {
    folder: PathBuf,
    playlists: Vec<Playlist>,
}

impl Store {
    /// Scan `folder` once and load every recognized playlist file. The
    /// folder is created if absent. No client operation is served before
    /// this returns.
    pub(crate) fn open(folder: &Path) -> Result<Self> {
        fs::create_dir_all(folder)?;
        // Canonical so playlist URIs are absolute regardless of how the
        // folder was configured.
        let folder = fs::canonicalize(folder)?;

        let mut playlists = Vec::new();
        for entry in WalkDir::new(&folder)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_playlist_file(path) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            match load_playlist(path, name) {
                Ok(playlist) => playlists.push(playlist),
                Err(err) => warn!("playlists: skipping {}: {err}", path.display()),
            }
        }
        playlists.sort_by(|a, b| a.name.cmp(&b.name));
        info!(
            "playlists: loaded {} playlist(s) from {}",
            playlists.len(),
            folder.display()
        );

        Ok(Self { folder, playlists })
    }

    pub(crate) fn playlists(&self) -> Vec<Playlist> {
        self.playlists.clone()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Create an empty named playlist and its backing file. The sanitized
    /// name is the canonical one, so a later folder scan recovers it
    /// unchanged.
    pub(crate) fn create(&mut self, name: &str) -> Result<Playlist> {
        self.create_with_tracks(name, Vec::new())
    }

    fn create_with_tracks(&mut self, name: &str, tracks: Vec<Track>) -> Result<Playlist> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(Error::InvalidState("playlist name is empty"));
        }
        if self.exists(&name) {
            return Err(Error::DuplicateName(name));
        }
        let path = self.path_for(&name);
        // A file may sit at the target without a store entry (skipped at
        // load time, or dropped there since); never overwrite it.
        if path.exists() {
            return Err(Error::DuplicateName(name));
        }
        write_atomic(&path, &tracks)?;
        debug!("playlists: created {}", path.display());

        let playlist = Playlist {
            name,
            uri: Some(file_url(&path)?),
            tracks,
            last_modified: Some(SystemTime::now()),
        };
        self.playlists.push(playlist.clone());
        Ok(playlist)
    }

    /// Persist `playlist`. Without a `uri` this behaves like `create`
    /// under `playlist.name`; with one it rewrites the backing file's
    /// track list in place. Renaming goes through [`Store::rename`].
    pub(crate) fn save(&mut self, playlist: &Playlist) -> Result<Playlist> {
        let Some(uri) = playlist.uri.as_deref() else {
            return self.create_with_tracks(&playlist.name, playlist.tracks.clone());
        };
        let pos = self
            .position_by_uri(uri)
            .ok_or_else(|| Error::NotFound(playlist.name.clone()))?;
        let path = self.path_for(&self.playlists[pos].name);
        write_atomic(&path, &playlist.tracks)?;
        debug!("playlists: saved {}", path.display());

        let entry = &mut self.playlists[pos];
        entry.tracks = playlist.tracks.clone();
        entry.last_modified = Some(SystemTime::now());
        Ok(entry.clone())
    }

    /// Move the backing file to the sanitized `new_name` and update the
    /// entry. Contents are untouched by the move.
    pub(crate) fn rename(&mut self, playlist: &Playlist, new_name: &str) -> Result<Playlist> {
        let pos = self
            .position_of(playlist)
            .ok_or_else(|| Error::NotFound(playlist.name.clone()))?;
        let new_name = sanitize_name(new_name);
        if new_name.is_empty() {
            return Err(Error::InvalidState("playlist name is empty"));
        }
        let old_name = self.playlists[pos].name.clone();
        if new_name == old_name {
            return Ok(self.playlists[pos].clone());
        }
        if self.exists(&new_name) {
            return Err(Error::DuplicateName(new_name));
        }

        let old_path = self.path_for(&old_name);
        let new_path = self.path_for(&new_name);
        // `fs::rename` replaces an existing target; an unregistered file
        // at the new path must survive.
        if new_path.exists() {
            return Err(Error::DuplicateName(new_name));
        }
        fs::rename(&old_path, &new_path)?;
        debug!(
            "playlists: renamed {} -> {}",
            old_path.display(),
            new_path.display()
        );

        let entry = &mut self.playlists[pos];
        entry.name = new_name;
        entry.uri = Some(file_url(&new_path)?);
        entry.last_modified = Some(SystemTime::now());
        Ok(entry.clone())
    }

    /// Remove the entry and its backing file. Unknown playlists are a
    /// silent no-op so a double delete never faults.
    pub(crate) fn delete(&mut self, playlist: &Playlist) -> Result<()> {
        let Some(pos) = self.position_of(playlist) else {
            debug!("playlists: delete of unknown playlist {:?}", playlist.name);
            return Ok(());
        };
        let path = self.path_for(&self.playlists[pos].name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            // Entry without a file: still drop the entry to restore the
            // one-to-one invariant.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("playlists: backing file already gone: {}", path.display());
            }
            Err(err) => return Err(err.into()),
        }
        self.playlists.remove(pos);
        debug!("playlists: deleted {}", path.display());
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.folder.join(format!("{name}.{PLAYLIST_EXT}"))
    }

    fn position_by_uri(&self, uri: &str) -> Option<usize> {
        self.playlists
            .iter()
            .position(|p| p.uri.as_deref() == Some(uri))
    }

    fn position_of(&self, playlist: &Playlist) -> Option<usize> {
        match playlist.uri.as_deref() {
            Some(uri) => self.position_by_uri(uri),
            None => self.playlists.iter().position(|p| p.name == playlist.name),
        }
    }
}

/// Replace filesystem-hostile characters so every name maps to exactly one
/// file and the scan-on-load naming scheme agrees with create/save/rename.
pub(crate) fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

fn is_playlist_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(PLAYLIST_EXT))
        .unwrap_or(false)
}

fn load_playlist(path: &Path, name: &str) -> Result<Playlist> {
    let contents = fs::read_to_string(path)?;
    let tracks = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Track::new)
        .collect();
    let last_modified = fs::metadata(path).and_then(|m| m.modified()).ok();

    Ok(Playlist {
        name: name.to_string(),
        uri: Some(file_url(path)?),
        tracks,
        last_modified,
    })
}

/// One track URI per line, newline-terminated. Written to a sibling temp
/// file first and renamed over the target so a failed write never leaves a
/// half-written playlist behind.
fn write_atomic(path: &Path, tracks: &[Track]) -> Result<()> {
    let mut contents = String::new();
    for track in tracks {
        contents.push_str(&track.uri);
        contents.push('\n');
    }

    let tmp = path.with_extension("tmp");
    if let Err(err) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

fn file_url(path: &Path) -> Result<String> {
    Url::from_file_path(path)
        .map(|u| u.to_string())
        .map_err(|()| {
            Error::Persistence(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not an absolute path: {}", path.display()),
            ))
        })
}

/// Client-facing handle over the store. File operations are synchronous
/// and block the caller until the filesystem settles.
#[derive(Clone)]
pub struct StoredPlaylistsController {
    store: Arc<Mutex<Store>>,
}

impl StoredPlaylistsController {
    pub(crate) fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All stored playlists, sorted by name at load time.
    pub fn playlists(&self) -> Vec<Playlist> {
        self.lock().playlists()
    }

    pub fn get(&self, name: &str) -> Option<Playlist> {
        self.lock().get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lock().exists(name)
    }

    pub fn create(&self, name: &str) -> Result<Playlist> {
        self.lock().create(name)
    }

    pub fn save(&self, playlist: &Playlist) -> Result<Playlist> {
        self.lock().save(playlist)
    }

    pub fn rename(&self, playlist: &Playlist, new_name: &str) -> Result<Playlist> {
        self.lock().rename(playlist, new_name)
    }

    pub fn delete(&self, playlist: &Playlist) -> Result<()> {
        self.lock().delete(playlist)
    }
}
