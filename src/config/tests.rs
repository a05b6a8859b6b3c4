use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

// Process environment is global; serialize every test that touches it.
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

/// Scoped env var override, restored on drop.
struct EnvVar {
    key: &'static str,
    previous: Option<std::ffi::OsString>,
}

impl EnvVar {
    fn apply(key: &'static str, val: Option<&str>) -> Self {
        let previous = std::env::var_os(key);
        unsafe {
            match val {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        Self { key, previous }
    }

    fn set(key: &'static str, val: &str) -> Self {
        Self::apply(key, Some(val))
    }

    fn unset(key: &'static str) -> Self {
        Self::apply(key, None)
    }
}

impl Drop for EnvVar {
    fn drop(&mut self) {
        unsafe {
            match self.previous.take() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }
}

#[test]
fn explicit_config_path_wins_over_xdg() {
    let _lock = env_lock();
    let _g1 = EnvVar::set("DACAPO_CONFIG_PATH", "/tmp/dacapo-test.toml");
    let _g2 = EnvVar::set("XDG_CONFIG_HOME", "/tmp/xdg-should-not-win");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/dacapo-test.toml")
    );
}

#[test]
fn config_path_defaults_to_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvVar::unset("DACAPO_CONFIG_PATH");
    let _g2 = EnvVar::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g3 = EnvVar::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home/dacapo/config.toml")
    );
}

#[test]
fn config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvVar::unset("XDG_CONFIG_HOME");
    let _g2 = EnvVar::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir/.config/dacapo/config.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playlists]
folder = "/var/lib/dacapo/playlists"

[library]
tag_cache = "/var/lib/dacapo/tag_cache"
music_folder = "/srv/music"
"#,
    )
    .unwrap();

    let _g1 = EnvVar::set("DACAPO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvVar::unset("DACAPO__PLAYLISTS__FOLDER");

    let s = Settings::load().unwrap();
    assert_eq!(s.playlists.folder, PathBuf::from("/var/lib/dacapo/playlists"));
    assert_eq!(s.library.tag_cache, PathBuf::from("/var/lib/dacapo/tag_cache"));
    assert_eq!(s.library.music_folder, PathBuf::from("/srv/music"));
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playlists]
folder = "/from/file"
"#,
    )
    .unwrap();

    let _g1 = EnvVar::set("DACAPO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvVar::set("DACAPO__PLAYLISTS__FOLDER", "/from/env");

    let s = Settings::load().unwrap();
    assert_eq!(s.playlists.folder, PathBuf::from("/from/env"));
}

#[test]
fn defaults_pass_validation() {
    let s = Settings::default();
    assert!(s.validate().is_ok());
    assert_eq!(s.playlists.folder, PathBuf::from("playlists"));
}

#[test]
fn empty_path_fails_validation() {
    let mut s = Settings::default();
    s.library.tag_cache = PathBuf::new();
    assert!(s.validate().is_err());
}
