//! Identifier generation
//!
//! Every entity created in a session gets a [`Uid`] made of the session id
//! (SUID) and a monotonic per-session sequence number. Sessions are persisted
//! by the repository, so uids restored from storage never collide with uids
//! minted later.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Session-scoped unique identifier, rendered as `"<session>-<seq>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid {
    session: u64,
    seq: u64,
}

impl Uid {
    pub fn new(session: u64, seq: u64) -> Self {
        Self { session, seq }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session, self.seq)
    }
}

impl FromStr for Uid {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidUid(s.to_string());
        let (session, seq) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            session: session.parse().map_err(|_| invalid())?,
            seq: seq.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for Uid {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.to_string()
    }
}

/// Mints [`Uid`]s for one session
#[derive(Debug)]
pub struct UidGenerator {
    session: u64,
    next: AtomicU64,
}

impl UidGenerator {
    /// Creates a generator for the given session id (SUID)
    pub fn new(session: u64) -> Self {
        Self {
            session,
            next: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Returns the next uid; strictly increasing within the session
    pub fn next(&self) -> Uid {
        Uid::new(self.session, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable book identity: the folder path for documents books, the playlist
/// persistent id for media-library books
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
