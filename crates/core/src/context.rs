//! Per-session object graph handed to every domain object

use crate::events::Dispatcher;
use crate::ids::{Uid, UidGenerator};
use std::sync::Arc;

/// Shared dispatcher and uid generator for one session
///
/// Cheap to clone. Tests build one per case so event streams never mix.
#[derive(Debug, Clone)]
pub struct DomainContext {
    dispatcher: Arc<Dispatcher>,
    uids: Arc<UidGenerator>,
}

impl DomainContext {
    pub fn new(session: u64) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new()),
            uids: Arc::new(UidGenerator::new(session)),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn next_uid(&self) -> Uid {
        self.uids.next()
    }

    pub fn session(&self) -> u64 {
        self.uids.session()
    }
}
