//! Boundary to the platform audio engine
//!
//! The engine only plays what it is told. Everything it reports comes back as
//! [`EngineEvent`]s, usually queued from its own thread through
//! [`event_channel`] and drained on the thread that owns the books.

use crate::error::PlayerResult;
use crate::resolver::MediaLocation;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Platform audio session
pub trait AudioEngine {
    /// Starts playing `location` at `start` seconds into the file, for at
    /// most `duration` seconds
    fn play(&mut self, location: &MediaLocation, start: f64, duration: f64) -> PlayerResult<()>;

    fn stop(&mut self);

    /// Jumps to `position` seconds into the loaded file
    fn seek(&mut self, position: f64);

    fn set_rate(&mut self, rate: f32);
}

/// Callbacks and remote-control intents reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    DidStart,
    /// Playback stopped before the item ended
    DidFinish,
    /// The item played to its end
    DidComplete,
    /// Position in seconds into the loaded file
    DidChangeTime(f64),
    ErrorOccurred(String),
    InterruptionBegan,
    InterruptionEnded,
    WillPlay,
    WillPause,
    WillTogglePlayPause,
    WillPlayNext,
    WillPlayPrev,
    /// Seconds into the current item
    WillUpdatePosition(f64),
}

/// Queue for engine callbacks
pub fn event_channel() -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
    unbounded()
}
