//! Composition root: wires the playback core, the stored-playlist store and
//! the library index together around injected capabilities.
//!
//! Construction is all-or-nothing: if the playlist folder cannot be prepared
//! or the tag cache fails to parse, `Backend::new` returns the error and no
//! half-initialized backend is handed out. The embedder supplies the audio
//! engine and mixer; the backend supplies cheap cloneable controllers.

use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::config::Settings;
use crate::current::CurrentPlaylistController;
use crate::engine::{AudioEngine, Mixer};
use crate::error::Result;
use crate::library::{Library, LibraryController};
use crate::playback::{self, Core, CoreHandle, EngineEventSink, PlaybackController};
use crate::playlists::{Store, StoredPlaylistsController};

/// The one URI scheme this backend can resolve and play.
pub const FILE_SCHEME: &str = "file://";

pub struct Backend {
    core: CoreHandle,
    store: Arc<Mutex<Store>>,
    library: Arc<Library>,
    uri_handlers: Vec<String>,
    destroyed: bool,
}

impl Backend {
    /// Build a backend from `settings` and the injected capabilities.
    /// Loads stored playlists and the library index before returning, so a
    /// constructed backend is fully ready to serve.
    pub fn new(
        settings: &Settings,
        engine: Box<dyn AudioEngine>,
        mixer: Box<dyn Mixer>,
    ) -> Result<Self> {
        let library = Arc::new(Library::open(
            &settings.library.tag_cache,
            &settings.library.music_folder,
        )?);
        let store = Arc::new(Mutex::new(Store::open(&settings.playlists.folder)?));

        let uri_handlers = vec![FILE_SCHEME.to_string()];
        let core = Core::new(engine, mixer, uri_handlers.clone());

        info!("backend: ready ({} library tracks)", library.len());
        Ok(Self {
            core,
            store,
            library,
            uri_handlers,
            destroyed: false,
        })
    }

    /// URI schemes this backend advertises. Tracks outside these schemes
    /// are rejected by `play` without a state change.
    pub fn uri_handlers(&self) -> &[String] {
        &self.uri_handlers
    }

    pub fn playback(&self) -> PlaybackController {
        PlaybackController::new(self.core.clone())
    }

    pub fn current_playlist(&self) -> CurrentPlaylistController {
        CurrentPlaylistController::new(self.core.clone())
    }

    pub fn stored_playlists(&self) -> StoredPlaylistsController {
        StoredPlaylistsController::new(self.store.clone())
    }

    pub fn library(&self) -> LibraryController {
        LibraryController::new(self.library.clone())
    }

    /// The sink the embedder hands to its engine thread.
    pub fn engine_events(&self) -> EngineEventSink {
        EngineEventSink::new(self.core.clone())
    }

    /// Stop playback and release the injected capabilities. Transport calls
    /// on outstanding controllers fail afterwards; playlist and library
    /// reads keep working. Calling twice is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            warn!("backend: destroy called twice");
            return;
        }
        self.destroyed = true;
        playback::release_capabilities(&self.core);
        info!("backend: destroyed");
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        if !self.destroyed {
            playback::release_capabilities(&self.core);
        }
    }
}
