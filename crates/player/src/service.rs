//! Keeps one audio engine in step with the current book
//!
//! Transport commands become cursor changes on the book's active collection,
//! and engine callbacks become cursor and play-state changes. The book's
//! domain events take care of persistence.

use crate::engine::{AudioEngine, EngineEvent};
use crate::error::{PlayerError, PlayerResult};
use crate::resolver::LocationResolver;
use audioshelf_config::PlayerConfig;
use audioshelf_core::{Book, PlayMode, PlayState, SharedBook};
use crossbeam_channel::Receiver;
use log::{debug, error, info, warn};

pub struct PlayerService<E: AudioEngine> {
    engine: E,
    resolver: LocationResolver,
    config: PlayerConfig,
    current: Option<SharedBook>,
    resume_after_interruption: bool,
}

impl<E: AudioEngine> PlayerService<E> {
    pub fn new(engine: E, resolver: LocationResolver, config: PlayerConfig) -> Self {
        Self {
            engine,
            resolver,
            config,
            current: None,
            resume_after_interruption: false,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn current_book(&self) -> Option<&SharedBook> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|book| book.lock().is_playing())
    }

    /// Loads `book` and starts playing its active collection's current item
    ///
    /// A finished item is skipped first, wrapping to the start. If the item
    /// cannot be located or the engine refuses it, the play state is left
    /// untouched.
    pub fn play(&mut self, book: &SharedBook) -> PlayerResult<()> {
        self.engine.stop();

        let switching = !self.current.as_ref().is_some_and(|c| c.ptr_eq(book));
        if switching {
            if let Some(previous) = self.current.replace(book.clone()) {
                previous.lock().set_play_state(PlayState::Stopped);
            }
        }

        let mut guard = book.lock();
        if switching {
            self.engine.set_rate(guard.rate());
        }

        let finished = guard.current_item().is_some_and(|item| item.is_finished());
        if finished {
            let next = guard.coll().next_index();
            debug!("Current item of {} finished, moving to {}", guard.id(), next);
            guard.set_cur_index(next)?;
        }

        self.start(&mut guard)
    }

    /// Hands the current item to the engine and marks the book playing
    fn start(&mut self, book: &mut Book) -> PlayerResult<()> {
        let Some(item) = book.current_item() else {
            return Err(PlayerError::NothingToPlay(book.id().clone()));
        };

        let Some(location) = self.resolver.resolve(item.file) else {
            let err = PlayerError::Unresolvable {
                name: item.file.name().to_string(),
                location: item.file.location().clone(),
            };
            error!("{}", err);
            return Err(err);
        };

        let start = item.start + item.progress;
        let remaining = (item.duration - item.progress).max(0.0);
        if let Err(e) = self.engine.play(&location, start, remaining) {
            error!("Engine refused {}: {}", location, e);
            return Err(e);
        }

        book.set_play_state(PlayState::Playing);
        debug!("Playing {} from {:.1}s", location, start);
        Ok(())
    }

    /// Stops the engine; the cursor stays where it is
    pub fn pause(&mut self) {
        self.engine.stop();
        if let Some(book) = &self.current {
            book.lock().set_play_state(PlayState::Stopped);
        }
    }

    /// Plays if paused, pauses if playing
    pub fn toggle(&mut self) -> PlayerResult<()> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.resume()
        }
    }

    fn resume(&mut self) -> PlayerResult<()> {
        let book = self.current.clone().ok_or(PlayerError::NoBook)?;
        self.play(&book)
    }

    pub fn play_next(&mut self) -> PlayerResult<()> {
        self.step(|book| book.coll().next_index())
    }

    pub fn play_prev(&mut self) -> PlayerResult<()> {
        self.step(|book| book.coll().prev_index())
    }

    fn step(&mut self, target: impl FnOnce(&Book) -> usize) -> PlayerResult<()> {
        let book = self.current.clone().ok_or(PlayerError::NoBook)?;
        {
            let mut guard = book.lock();
            let index = target(&guard);
            guard.set_cur_index(index)?;
        }
        self.play(&book)
    }

    /// Moves to `value` seconds into the current item
    pub fn update_position(&mut self, value: f64) -> PlayerResult<()> {
        let book = self.current.clone().ok_or(PlayerError::NoBook)?;
        let mut guard = book.lock();
        let (start, duration) = guard
            .current_item()
            .map(|item| (item.start, item.duration))
            .ok_or_else(|| PlayerError::NothingToPlay(guard.id().clone()))?;

        let value = value.clamp(0.0, duration);
        self.engine.seek(start + value);
        guard.set_cur_progress(value);
        Ok(())
    }

    /// Jumps `seconds` forward (or back if negative) within the current item
    pub fn skip(&mut self, seconds: f64) -> PlayerResult<()> {
        let book = self.current.clone().ok_or(PlayerError::NoBook)?;
        let progress = book.lock().coll().cur_progress();
        self.update_position(progress + seconds)
    }

    pub fn skip_forward(&mut self) -> PlayerResult<()> {
        self.skip(self.config.skip_interval_secs as f64)
    }

    pub fn skip_back(&mut self) -> PlayerResult<()> {
        self.skip(-(self.config.skip_interval_secs as f64))
    }

    /// Sets the current book's rate, clamped to the configured bounds
    ///
    /// The engine only hears about it while playing. Returns the applied rate.
    pub fn set_rate(&mut self, rate: f32) -> PlayerResult<f32> {
        let book = self.current.clone().ok_or(PlayerError::NoBook)?;
        let rate = self.config.clamp_rate(rate);

        let mut guard = book.lock();
        guard.set_rate(rate)?;
        if guard.is_playing() {
            self.engine.set_rate(rate);
        }
        Ok(rate)
    }

    pub fn faster(&mut self) -> PlayerResult<f32> {
        let rate = self.current_rate()? + self.config.rate_step;
        self.set_rate(rate)
    }

    pub fn slower(&mut self) -> PlayerResult<f32> {
        let rate = self.current_rate()? - self.config.rate_step;
        self.set_rate(rate)
    }

    fn current_rate(&self) -> PlayerResult<f32> {
        let book = self.current.as_ref().ok_or(PlayerError::NoBook)?;
        let rate = book.lock().rate();
        Ok(rate)
    }

    /// Applies one engine callback or remote intent
    pub fn handle_event(&mut self, event: EngineEvent) -> PlayerResult<()> {
        debug!("Engine event {:?}", event);
        match event {
            EngineEvent::DidStart => Ok(()),
            EngineEvent::DidChangeTime(time) => {
                if let Some(book) = &self.current {
                    let mut guard = book.lock();
                    let progress = guard
                        .current_item()
                        .map(|item| (time - item.start).clamp(0.0, item.duration));
                    if let Some(progress) = progress {
                        guard.set_cur_progress(progress);
                    }
                }
                Ok(())
            }
            EngineEvent::DidFinish => {
                if let Some(book) = &self.current {
                    book.lock().set_play_state(PlayState::Paused);
                }
                Ok(())
            }
            EngineEvent::DidComplete => self.complete(),
            EngineEvent::ErrorOccurred(message) => {
                error!("Playback error: {}", message);
                Ok(())
            }
            EngineEvent::InterruptionBegan => {
                self.resume_after_interruption = self.is_playing();
                if self.resume_after_interruption {
                    info!("Interrupted, pausing");
                    self.pause();
                }
                Ok(())
            }
            EngineEvent::InterruptionEnded => {
                if std::mem::take(&mut self.resume_after_interruption) {
                    info!("Interruption ended, resuming");
                    self.resume()
                } else {
                    Ok(())
                }
            }
            EngineEvent::WillPlay => self.resume(),
            EngineEvent::WillPause => {
                self.pause();
                Ok(())
            }
            EngineEvent::WillTogglePlayPause => self.toggle(),
            EngineEvent::WillPlayNext => self.play_next(),
            EngineEvent::WillPlayPrev => self.play_prev(),
            EngineEvent::WillUpdatePosition(value) => self.update_position(value),
        }
    }

    /// The engine played the current item to its end
    fn complete(&mut self) -> PlayerResult<()> {
        let book = self.current.clone().ok_or(PlayerError::NoBook)?;
        let advance = {
            let mut guard = book.lock();
            let coll = guard.coll();
            if coll.mode() == PlayMode::AudioFile && coll.has_next() {
                let next = coll.cur_index() + 1;
                guard.set_cur_index(next)?;
                true
            } else {
                if let Some(duration) = guard.current_item().map(|item| item.duration) {
                    guard.set_cur_progress(duration);
                }
                guard.set_play_state(PlayState::Paused);
                false
            }
        };

        if advance {
            self.play(&book)
        } else {
            info!("Finished {}", book.id());
            Ok(())
        }
    }

    /// Handles every queued engine event; returns how many were handled
    ///
    /// A failing event is logged and does not stop the rest.
    pub fn drain_events(&mut self, events: &Receiver<EngineEvent>) -> usize {
        let mut handled = 0;
        for event in events.try_iter() {
            if let Err(e) = self.handle_event(event) {
                warn!("Engine event failed: {}", e);
            }
            handled += 1;
        }
        handled
    }
}

impl<E: AudioEngine> std::fmt::Debug for PlayerService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerService")
            .field("current", &self.current)
            .field("resume_after_interruption", &self.resume_after_interruption)
            .finish_non_exhaustive()
    }
}
