use std::path::PathBuf;

use serde::Deserialize;

/// Top-level backend settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/dacapo/config.toml` or
/// `~/.config/dacapo/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `DACAPO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
///
/// Settings are consumed once, at backend construction; the core never
/// re-reads or reloads them.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub playlists: PlaylistsSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaylistsSettings {
    /// Directory holding one `.m3u` file per stored playlist. Created at
    /// startup if absent.
    pub folder: PathBuf,
}

impl Default for PlaylistsSettings {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("playlists"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// The precomputed tag-cache file the library index is built from.
    pub tag_cache: PathBuf,
    /// Root directory the tag cache's relative file paths are scoped under.
    pub music_folder: PathBuf,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            tag_cache: PathBuf::from("tag_cache"),
            music_folder: PathBuf::from("music"),
        }
    }
}
