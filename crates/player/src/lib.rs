//! audioshelf player coordination
//!
//! [`PlayerService`] drives one [`AudioEngine`] from whichever collection is
//! active on the current book. Engines report back through
//! [`EngineEvent`]s; [`LocationResolver`] turns audio files into something
//! the engine can open.

mod engine;
mod error;
mod resolver;
mod service;

pub use engine::{event_channel, AudioEngine, EngineEvent};
pub use error::{PlayerError, PlayerResult};
pub use resolver::{LocationResolver, MediaLocation};
pub use service::PlayerService;

pub type Result<T> = std::result::Result<T, PlayerError>;
