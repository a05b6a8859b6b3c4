use std::{env, path::PathBuf};

use super::schema::Settings;

impl Settings {
    /// Load settings, layering environment variables (prefix `DACAPO__`)
    /// over an optional config file over struct defaults.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder
            .add_source(
                ::config::Environment::with_prefix("DACAPO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject settings the backend cannot start from. All three paths are
    /// consumed at construction, so an empty one would only fail later and
    /// less clearly.
    pub fn validate(&self) -> Result<(), String> {
        for (key, path) in [
            ("playlists.folder", &self.playlists.folder),
            ("library.tag_cache", &self.library.tag_cache),
            ("library.music_folder", &self.library.music_folder),
        ] {
            if path.as_os_str().is_empty() {
                return Err(format!("{key} must not be empty"));
            }
        }
        Ok(())
    }
}

/// Resolve the config path from `DACAPO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    match env::var_os("DACAPO_CONFIG_PATH") {
        Some(p) => Some(PathBuf::from(p)),
        None => default_config_path(),
    }
}

/// The default config path: `$XDG_CONFIG_HOME/dacapo/config.toml`, falling
/// back to `~/.config/dacapo/config.toml` when `XDG_CONFIG_HOME` is unset.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = match env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) => PathBuf::from(xdg),
        None => PathBuf::from(env::var_os("HOME")?).join(".config"),
    };
    Some(config_home.join("dacapo").join("config.toml"))
}
