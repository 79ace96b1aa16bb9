//! Domain events and the session-wide dispatcher
//!
//! Every mutation notification flows through one [`Dispatcher`]. Delivery is
//! synchronous, on the calling thread, in subscription order. Subscribers must
//! be cheap: the repository only records a book id and arms a timer.
//!
//! Events carry identifiers rather than the book itself because they are
//! emitted while the book is borrowed mutably.

use crate::ids::{BookId, Uid};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Identity of the book an event is about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookRef {
    pub uid: Uid,
    pub id: BookId,
}

/// Events published on the domain dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A persisted property of the book changed
    BookStateChanged(BookRef),
    /// `added_to_playlist` flipped to true
    BookToPlaylistAdded(BookRef),
    /// `added_to_playlist` flipped to false
    BookFromPlaylistRemoved(BookRef),
    /// `is_damaged` flipped to true
    BookIsDamaged(BookRef),
    /// Playback progress within a file changed
    AudioFileStateChanged { book: BookRef, file: Uid },
    /// The initial load scan finished and all valid books are published
    RepositoryIsReady { books: usize },
    /// A debounced flush wrote every pending book
    RepositoryStoreComplete { stored: usize },
}

impl DomainEvent {
    /// Returns the book this event refers to, if any
    pub fn book(&self) -> Option<&BookRef> {
        match self {
            Self::BookStateChanged(book)
            | Self::BookToPlaylistAdded(book)
            | Self::BookFromPlaylistRemoved(book)
            | Self::BookIsDamaged(book)
            | Self::AudioFileStateChanged { book, .. } => Some(book),
            Self::RepositoryIsReady { .. } | Self::RepositoryStoreComplete { .. } => None,
        }
    }
}

/// Handle returned by [`Dispatcher::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&DomainEvent) + Send + Sync>;

/// Broadcast channel for domain events
///
/// Construct one per session (or per test) and share it by `Arc`.
#[derive(Default)]
pub struct Dispatcher {
    subscribers: RwLock<Vec<(SubscriptionId, Callback)>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked for every subsequent event
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DomainEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        id
    }

    /// Removes a subscription; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Delivers `event` to every current subscriber, in subscription order
    pub fn notify(&self, event: DomainEvent) {
        // Snapshot so a callback may subscribe without deadlocking.
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        log::trace!("dispatching {:?} to {} subscribers", event, callbacks.len());
        for callback in callbacks {
            callback(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Collects every event it sees; handy for tests and diagnostics
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<std::sync::Mutex<Vec<DomainEvent>>>,
}

impl EventLog {
    /// Subscribes a new log to `dispatcher`
    pub fn attach(dispatcher: &Dispatcher) -> Self {
        let log = Self::default();
        let sink = Arc::clone(&log.events);
        dispatcher.subscribe(move |event| {
            sink.lock().unwrap_or_else(|e| e.into_inner()).push(event.clone());
        });
        log
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Counts events matching `predicate`
    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&DomainEvent) -> bool,
    {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| predicate(e))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
