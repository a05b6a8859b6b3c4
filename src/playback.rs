//! Playback transport: a state machine over the current playlist.
//!
//! All transport calls and all engine-originated events funnel through one
//! mutex around `Core`, so a `stop()` can never race an end-of-track event
//! into an inconsistent state. The engine renders audio; this module only
//! decides which track it should render and in which state the machine is.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, warn};

use crate::current::CurrentPlaylist;
use crate::engine::{AudioEngine, EngineEvent, Mixer};
use crate::error::{Error, Result};
use crate::models::Track;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Everything that must mutate atomically: the tracklist, the transport
/// state and the injected capabilities. `engine`/`mixer` become `None`
/// once the backend is destroyed.
pub(crate) struct Core {
    pub(crate) tracklist: CurrentPlaylist,
    pub(crate) state: PlaybackState,
    pub(crate) engine: Option<Box<dyn AudioEngine>>,
    pub(crate) mixer: Option<Box<dyn Mixer>>,
    pub(crate) uri_handlers: Vec<String>,
    pub(crate) last_error: Option<String>,
}

pub(crate) type CoreHandle = Arc<Mutex<Core>>;

/// Take the serialization lock, recovering the data from a poisoned mutex
/// rather than propagating a panic from an unrelated thread.
pub(crate) fn lock(core: &CoreHandle) -> MutexGuard<'_, Core> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Core {
    pub(crate) fn new(
        engine: Box<dyn AudioEngine>,
        mixer: Box<dyn Mixer>,
        uri_handlers: Vec<String>,
    ) -> CoreHandle {
        Arc::new(Mutex::new(Self {
            tracklist: CurrentPlaylist::new(),
            state: PlaybackState::Stopped,
            engine: Some(engine),
            mixer: Some(mixer),
            uri_handlers,
            last_error: None,
        }))
    }

    fn engine_mut(&mut self) -> Result<&mut Box<dyn AudioEngine>> {
        self.engine
            .as_mut()
            .ok_or(Error::InvalidState("backend destroyed"))
    }

    fn resolvable(&self, uri: &str) -> bool {
        self.uri_handlers.iter().any(|h| uri.starts_with(h.as_str()))
    }

    /// Stop rendering and land in `Stopped`. Effective even mid-start and
    /// after destroy.
    pub(crate) fn enter_stopped(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        if self.state != PlaybackState::Stopped {
            debug!("playback: {:?} -> Stopped", self.state);
        }
        self.state = PlaybackState::Stopped;
    }

    /// Resolve and start the cursor track. On engine refusal the machine
    /// lands in `Stopped`; on an unadvertised scheme nothing changes.
    fn start_current(&mut self) -> Result<()> {
        let uri = match self.tracklist.current() {
            Some(t) => t.uri.clone(),
            None => return Err(Error::InvalidState("no current track")),
        };
        if !self.resolvable(&uri) {
            return Err(Error::UnplayableTrack(uri));
        }
        match self.engine_mut()?.start(&uri) {
            Ok(()) => {
                debug!("playback: starting {uri}");
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(err) => {
                self.enter_stopped();
                Err(Error::Playback(err.to_string()))
            }
        }
    }

    pub(crate) fn play(&mut self) -> Result<()> {
        if self.tracklist.current().is_none() {
            let first = self.tracklist.tracks().first().and_then(|t| t.id);
            match first {
                Some(id) => self.tracklist.set_current(Some(id))?,
                None => return Err(Error::InvalidState("current playlist is empty")),
            }
        }
        self.start_current()
    }

    pub(crate) fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Err(Error::InvalidState("pause requires playing"));
        }
        match self.engine_mut()?.pause() {
            Ok(()) => {
                debug!("playback: Playing -> Paused");
                self.state = PlaybackState::Paused;
                Ok(())
            }
            Err(err) => {
                self.enter_stopped();
                Err(Error::Playback(err.to_string()))
            }
        }
    }

    pub(crate) fn resume(&mut self) -> Result<()> {
        if self.state != PlaybackState::Paused {
            return Err(Error::InvalidState("resume requires paused"));
        }
        match self.engine_mut()?.resume() {
            Ok(()) => {
                debug!("playback: Paused -> Playing");
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(err) => {
                self.enter_stopped();
                Err(Error::Playback(err.to_string()))
            }
        }
    }

    pub(crate) fn stop(&mut self) {
        self.enter_stopped();
    }

    /// Move the cursor to `id` (or stop at the playlist boundary) and, if
    /// the machine was playing, start the new track.
    fn skip_to(&mut self, id: Option<u64>) -> Result<()> {
        let was_playing = self.state == PlaybackState::Playing;
        let Some(id) = id else {
            // Do not wrap past the ends.
            self.enter_stopped();
            return Ok(());
        };
        self.tracklist.set_current(Some(id))?;
        if was_playing {
            self.start_current().inspect_err(|_| self.enter_stopped())
        } else {
            if self.state == PlaybackState::Paused {
                // The paused stream belongs to the old track; a new track
                // cannot be started pre-paused through the engine contract.
                self.enter_stopped();
            }
            Ok(())
        }
    }

    pub(crate) fn next(&mut self) -> Result<()> {
        let id = self.tracklist.peek_next().and_then(|t| t.id);
        self.skip_to(id)
    }

    pub(crate) fn previous(&mut self) -> Result<()> {
        let id = self.tracklist.peek_previous().and_then(|t| t.id);
        self.skip_to(id)
    }

    /// Engine reported the current track finished: advance like `next()`,
    /// stopping at the end of the playlist. Stale events (after `stop()`)
    /// are dropped.
    pub(crate) fn end_of_track(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!("playback: ignoring end-of-track while {:?}", self.state);
            return;
        }
        match self.tracklist.peek_next().and_then(|t| t.id) {
            Some(id) => {
                if self.tracklist.set_current(Some(id)).is_err() {
                    self.enter_stopped();
                    return;
                }
                if let Err(err) = self.start_current() {
                    error!("playback: auto-advance failed: {err}");
                    self.last_error = Some(err.to_string());
                    self.enter_stopped();
                }
            }
            None => {
                debug!("playback: end of playlist");
                self.enter_stopped();
            }
        }
    }

    /// Engine reported an unrecoverable failure: never stay in
    /// Playing/Paused, surface the message to the observer.
    pub(crate) fn engine_error(&mut self, message: String) {
        if self.state == PlaybackState::Stopped {
            debug!("playback: ignoring engine error while stopped: {message}");
            return;
        }
        error!("playback: engine error: {message}");
        self.last_error = Some(message);
        self.enter_stopped();
    }
}

/// Client transport handle. Every call is serialized against the other
/// controllers and against engine events.
#[derive(Clone)]
pub struct PlaybackController {
    core: CoreHandle,
}

impl PlaybackController {
    pub(crate) fn new(core: CoreHandle) -> Self {
        Self { core }
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.core).state
    }

    /// Start playing the cursor track (or the first track when no cursor
    /// is set). Fails without state change if the track's URI scheme is
    /// not advertised by this backend.
    pub fn play(&self) -> Result<()> {
        lock(&self.core).play()
    }

    pub fn pause(&self) -> Result<()> {
        lock(&self.core).pause()
    }

    pub fn resume(&self) -> Result<()> {
        lock(&self.core).resume()
    }

    /// Always lands in `Stopped`, even mid-start.
    pub fn stop(&self) {
        lock(&self.core).stop()
    }

    pub fn next(&self) -> Result<()> {
        lock(&self.core).next()
    }

    pub fn previous(&self) -> Result<()> {
        lock(&self.core).previous()
    }

    pub fn current_track(&self) -> Option<Track> {
        lock(&self.core).tracklist.current().cloned()
    }

    /// Volume pass-through to the injected mixer.
    pub fn volume(&self) -> Result<u8> {
        lock(&self.core)
            .mixer
            .as_ref()
            .map(|m| m.volume())
            .ok_or(Error::InvalidState("backend destroyed"))
    }

    pub fn set_volume(&self, level: u8) -> Result<()> {
        let mut core = lock(&self.core);
        match core.mixer.as_mut() {
            Some(mixer) => {
                mixer.set_volume(level.min(100));
                Ok(())
            }
            None => Err(Error::InvalidState("backend destroyed")),
        }
    }

    /// Last engine-reported failure, cleared on read.
    pub fn take_last_error(&self) -> Option<String> {
        lock(&self.core).last_error.take()
    }
}

/// Where the embedder funnels engine events. Cloneable and `Send`, so the
/// engine's decoder/output thread can deliver directly; every event takes
/// the same lock as client transport calls.
#[derive(Clone)]
pub struct EngineEventSink {
    core: CoreHandle,
}

impl EngineEventSink {
    pub(crate) fn new(core: CoreHandle) -> Self {
        Self { core }
    }

    pub fn deliver(&self, event: EngineEvent) {
        let mut core = lock(&self.core);
        match event {
            EngineEvent::EndOfTrack => core.end_of_track(),
            EngineEvent::Error(message) => core.engine_error(message),
        }
    }
}

impl std::fmt::Debug for EngineEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineEventSink").finish_non_exhaustive()
    }
}

/// Release the injected capabilities. Used by `Backend::destroy`.
pub(crate) fn release_capabilities(core: &CoreHandle) {
    let mut core = lock(core);
    core.enter_stopped();
    if core.engine.take().is_none() {
        warn!("playback: capabilities already released");
    }
    core.mixer.take();
}
