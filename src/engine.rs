//! Injected capabilities: the audio engine and the mixer.
//!
//! The core never decodes or renders audio. A concrete engine lives behind
//! `AudioEngine` and reports asynchronous outcomes (track finished, decode
//! or output failure) as `EngineEvent`s, which the embedder feeds into the
//! backend's `EngineEventSink` from whatever thread the engine runs on.

use crate::error::Result;

/// Transport surface of an external audio engine.
///
/// `start` is asynchronous by contract: an `Ok` return means the engine
/// accepted the URI, not that audio is audible. Failures after acceptance
/// arrive as `EngineEvent::Error`.
pub trait AudioEngine: Send {
    fn start(&mut self, uri: &str) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    /// Release playback resources. Must be safe to call in any state.
    fn stop(&mut self);
}

/// Volume pass-through to an external mixer. Levels are 0..=100.
pub trait Mixer: Send {
    fn volume(&self) -> u8;
    fn set_volume(&mut self, level: u8);
}

/// Events an engine delivers back to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The current track played to its end.
    EndOfTrack,
    /// Unrecoverable engine failure while rendering.
    Error(String),
}
