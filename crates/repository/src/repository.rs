//! Book repository
//!
//! In-memory index of every known book, backed by the record store. The
//! initial load and every flush run off the calling thread; flushes are
//! debounced and triggered only by domain events.

use crate::error::{RepositoryError, RepositoryResult};
use crate::record::BookRecord;
use crate::store::RecordStore;
use audioshelf_core::{
    Book, BookId, BookRef, DomainContext, DomainEvent, MediaLibrary, SharedBook, Source,
    SubscriptionId, Uid,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Default delay between the first change and the flush that stores it
pub const DEFAULT_FLUSH_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Repository knobs, usually filled from the storage config section
#[derive(Debug, Clone)]
pub struct RepositorySettings {
    /// Directory holding one record per book
    pub books_dir: PathBuf,
    /// Record file extension, without the dot
    pub record_extension: String,
    pub flush_debounce: Duration,
}

impl RepositorySettings {
    pub fn new(books_dir: impl Into<PathBuf>) -> Self {
        Self {
            books_dir: books_dir.into(),
            record_extension: "json".to_string(),
            flush_debounce: DEFAULT_FLUSH_DEBOUNCE,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.record_extension = extension.into();
        self
    }

    pub fn with_flush_debounce(mut self, debounce: Duration) -> Self {
        self.flush_debounce = debounce;
        self
    }
}

/// Persistent, observable collection of books
///
/// Cloning is cheap; clones share the same index.
#[derive(Clone)]
pub struct BookRepository {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: DomainContext,
    store: RecordStore,
    library: Arc<dyn MediaLibrary>,
    runtime: Handle,
    debounce: Duration,
    books: RwLock<HashMap<BookId, SharedBook>>,
    published: watch::Sender<Vec<SharedBook>>,
    ready: watch::Sender<bool>,
    pending: Mutex<Vec<BookId>>,
    flush_armed: AtomicBool,
    subscription: OnceLock<SubscriptionId>,
}

impl BookRepository {
    /// Creates the repository and starts loading stored records
    ///
    /// Must be called inside a tokio runtime. The repository is empty until
    /// [`is_ready`](Self::is_ready) turns true.
    pub fn new(
        ctx: &DomainContext,
        settings: RepositorySettings,
        library: Arc<dyn MediaLibrary>,
    ) -> RepositoryResult<Self> {
        let runtime = Handle::try_current().map_err(|_| RepositoryError::NoRuntime)?;
        let store = RecordStore::new(settings.books_dir, settings.record_extension);
        if let Err(e) = store.ensure_dir() {
            log::error!("{}", e);
        }

        let (published, _) = watch::channel(Vec::new());
        let (ready, _) = watch::channel(false);
        let inner = Arc::new(Inner {
            ctx: ctx.clone(),
            store,
            library,
            runtime,
            debounce: settings.flush_debounce,
            books: RwLock::new(HashMap::new()),
            published,
            ready,
            pending: Mutex::new(Vec::new()),
            flush_armed: AtomicBool::new(false),
            subscription: OnceLock::new(),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = ctx.dispatcher().subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_event(event);
            }
        });
        let _ = inner.subscription.set(subscription);

        let loader = Arc::clone(&inner);
        inner.runtime.spawn(async move { loader.load().await });

        Ok(Self { inner })
    }

    pub fn context(&self) -> &DomainContext {
        &self.inner.ctx
    }

    pub fn books_dir(&self) -> &std::path::Path {
        self.inner.store.dir()
    }

    /// True once the initial load has published its books
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    /// Waits for the initial load to finish
    pub async fn wait_until_ready(&self) {
        let mut ready = self.inner.ready.subscribe();
        // The sender lives in `inner`, so the channel cannot close here
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Registers books not already known by id
    ///
    /// Known ids and destroyed books are skipped. Returns how many were added;
    /// only those are appended to the published collection.
    pub fn write(&self, books: &[SharedBook]) -> usize {
        // Books are never locked while the index is held
        let live: Vec<&SharedBook> = books.iter().filter(|b| !b.lock().is_destroyed()).collect();

        let mut added = Vec::new();
        {
            let mut index = self.inner.write_index();
            for book in live {
                if index.contains_key(book.id()) {
                    continue;
                }
                index.insert(book.id().clone(), book.clone());
                added.push(book.clone());
            }
        }

        if added.is_empty() {
            return 0;
        }

        log::info!("Added {} book(s) to the repository", added.len());
        for book in &added {
            self.inner.schedule_store(book.id().clone());
        }
        let count = added.len();
        self.inner.published.send_modify(|published| published.extend(added));
        count
    }

    pub fn read(&self, id: &BookId) -> Option<SharedBook> {
        self.inner.read_index().get(id).cloned()
    }

    pub fn has(&self, id: &BookId) -> bool {
        self.inner.read_index().contains_key(id)
    }

    /// Deletes the book's record and forgets it
    ///
    /// The returned aggregate is marked destroyed and will never be stored
    /// again. If the record cannot be deleted the book stays registered and
    /// untouched.
    pub fn remove(&self, id: &BookId) -> RepositoryResult<Option<SharedBook>> {
        let book = {
            // Held across the delete so a flush finishing meanwhile sees the eviction
            let mut index = self.inner.write_index();
            let Some(book) = index.get(id).cloned() else {
                return Ok(None);
            };
            self.inner.store.delete(book.uid())?;
            index.remove(id);
            book
        };
        book.lock().mark_destroyed();
        self.inner
            .published
            .send_modify(|published| published.retain(|b| !b.ptr_eq(&book)));
        log::info!("Removed book {}", id);
        Ok(Some(book))
    }

    pub fn count(&self) -> usize {
        self.inner.read_index().len()
    }

    /// Snapshot of the published collection
    pub fn books(&self) -> Vec<SharedBook> {
        self.inner.published.borrow().clone()
    }

    /// Published books of one source
    pub fn books_of_source(&self, source: Source) -> Vec<SharedBook> {
        self.books()
            .into_iter()
            .filter(|b| b.lock().source() == source)
            .collect()
    }

    /// Observes the published collection
    pub fn subscribe(&self) -> watch::Receiver<Vec<SharedBook>> {
        self.inner.published.subscribe()
    }

    /// Stores every pending book immediately
    pub async fn flush_now(&self) -> usize {
        self.inner.flush().await
    }
}

impl std::fmt::Debug for BookRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookRepository")
            .field("dir", &self.inner.store.dir())
            .field("books", &self.count())
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl Inner {
    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, HashMap<BookId, SharedBook>> {
        self.books.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_index(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<BookId, SharedBook>> {
        self.books.write().unwrap_or_else(|e| e.into_inner())
    }

    fn recognizes(&self, book: &BookRef) -> bool {
        self.read_index()
            .get(&book.id)
            .is_some_and(|known| known.uid() == book.uid)
    }

    fn on_event(self: &Arc<Self>, event: &DomainEvent) {
        let book = match event {
            DomainEvent::BookStateChanged(book) => book,
            DomainEvent::AudioFileStateChanged { book, .. } => book,
            _ => return,
        };
        if self.recognizes(book) {
            self.schedule_store(book.id.clone());
        }
    }

    /// Queues `id` and arms a flush unless one is already armed
    fn schedule_store(self: &Arc<Self>, id: BookId) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(id);

        if !self.flush_armed.swap(true, Ordering::AcqRel) {
            let inner = Arc::clone(self);
            self.runtime.spawn(async move {
                tokio::time::sleep(inner.debounce).await;
                inner.flush().await;
            });
        }
    }

    /// Writes every pending book; returns how many were stored
    async fn flush(self: &Arc<Self>) -> usize {
        self.flush_armed.store(false, Ordering::Release);

        let ids = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let mut seen = HashSet::new();
            let mut ids = std::mem::take(&mut *pending);
            ids.retain(|id| seen.insert(id.clone()));
            ids
        };

        // Snapshot on this side so the blocking writer never touches a book
        let mut snapshots = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(shared) = self.read_index().get(&id).cloned() else {
                continue;
            };
            let book = shared.lock();
            if book.is_destroyed() {
                continue;
            }
            snapshots.push((id, book.uid(), BookRecord::from_book(&book)));
        }
        if snapshots.is_empty() {
            return 0;
        }

        let store = self.store.clone();
        let written = tokio::task::spawn_blocking(move || {
            let mut written = Vec::new();
            let mut failed = Vec::new();
            for (id, uid, record) in snapshots {
                match store.write_record(uid, &record) {
                    Ok(()) => written.push((id, uid)),
                    Err(e) => {
                        log::error!("Failed to store book {}: {}", id, e);
                        failed.push(id);
                    }
                }
            }
            (written, failed)
        })
        .await;

        let (written, failed) = match written {
            Ok(result) => result,
            Err(e) => {
                log::error!("Flush task failed: {}", e);
                return 0;
            }
        };

        // Failed books stay in memory and ride along with the next flush
        if !failed.is_empty() {
            self.pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .extend(failed);
        }

        // A book removed while its record was being written must not come back
        for (id, uid) in &written {
            let still_known = self
                .read_index()
                .get(id)
                .is_some_and(|known| known.uid() == *uid);
            if !still_known {
                if let Err(e) = self.store.delete(*uid) {
                    log::error!("{}", e);
                }
            }
        }

        let stored = written.len();
        if stored > 0 {
            log::info!("Stored {} book(s)", stored);
            self.ctx
                .dispatcher()
                .notify(DomainEvent::RepositoryStoreComplete { stored });
        }
        stored
    }

    async fn load(self: Arc<Self>) {
        let store = self.store.clone();
        let ctx = self.ctx.clone();
        let library = Arc::clone(&self.library);

        let loaded =
            tokio::task::spawn_blocking(move || scan(&store, &ctx, library.as_ref())).await;
        let loaded = match loaded {
            Ok(books) => books,
            Err(e) => {
                log::error!("Record scan failed: {}", e);
                Vec::new()
            }
        };

        let mut batch = Vec::with_capacity(loaded.len());
        {
            let mut index = self.write_index();
            for book in loaded {
                if index.contains_key(book.id()) {
                    log::warn!(
                        "Book {} was registered before loading finished; dropping stored copy",
                        book.id()
                    );
                    if let Err(e) = self.store.delete(book.uid()) {
                        log::error!("{}", e);
                    }
                    continue;
                }
                let shared = SharedBook::new(book);
                index.insert(shared.id().clone(), shared.clone());
                batch.push(shared);
            }
        }

        let books = batch.len();
        self.published.send_modify(|published| published.extend(batch));
        self.ready.send_replace(true);
        log::info!("Repository ready with {} book(s)", books);
        self.ctx
            .dispatcher()
            .notify(DomainEvent::RepositoryIsReady { books });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get() {
            self.ctx.dispatcher().unsubscribe(*id);
        }
    }
}

/// Reads every record, pruning the ones that cannot or should not be loaded
fn scan(store: &RecordStore, ctx: &DomainContext, library: &dyn MediaLibrary) -> Vec<Book> {
    let paths = match store.list() {
        Ok(paths) => paths,
        Err(e) => {
            log::error!("{}", e);
            return Vec::new();
        }
    };

    let mut books = Vec::with_capacity(paths.len());
    let mut seen_ids = HashSet::new();
    let mut seen_uids: HashSet<Uid> = HashSet::new();

    for path in paths {
        let book = store
            .read_record(&path)
            .and_then(|record| {
                record.into_book(ctx).map_err(|e| RepositoryError::Record {
                    path: path.clone(),
                    source: e,
                })
            });

        let book = match book {
            Ok(book) => book,
            Err(e) if e.is_record_fault() => {
                log::error!("{}; pruning", e);
                prune(store, &path);
                continue;
            }
            Err(e) => {
                log::error!("{}", e);
                continue;
            }
        };

        if let Some(playlist_id) = book.location().playlist_id() {
            if !library.playlist_exists(playlist_id) {
                log::info!(
                    "Playlist {} of '{}' no longer exists; deleting record",
                    playlist_id,
                    book.title()
                );
                prune(store, &path);
                continue;
            }
        }

        if !seen_ids.insert(book.id().clone()) || !seen_uids.insert(book.uid()) {
            log::warn!("Duplicate record for book {}; pruning {}", book.id(), path.display());
            prune(store, &path);
            continue;
        }

        books.push(book);
    }

    log::debug!("Loaded {} record(s) from {}", books.len(), store.dir().display());
    books
}

fn prune(store: &RecordStore, path: &std::path::Path) {
    if let Err(e) = store.delete_path(path) {
        log::error!("{}", e);
    }
}
