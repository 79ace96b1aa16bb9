//! audioshelf book repository
//!
//! Persists every [`Book`](audioshelf_core::Book) as one JSON record named
//! after its uid, keeps an in-memory index by book id, and republishes the
//! book set through a `tokio::sync::watch` channel.
//!
//! Persistence is driven by domain events: `BookStateChanged` and
//! `AudioFileStateChanged` for a known book queue it for a debounced flush.

mod error;
pub mod record;
mod repository;
pub mod session;
pub mod store;

pub use error::{RecordError, RepositoryError, RepositoryResult};
pub use record::{deserialize_book, serialize_book, BookRecord, BookmarkRecord, FileRecord};
pub use repository::{BookRepository, RepositorySettings, DEFAULT_FLUSH_DEBOUNCE};
pub use session::next_session_id;
pub use store::RecordStore;
