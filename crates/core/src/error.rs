//! Error types and fault taxonomy for audioshelf
//!
//! Faults fall into four families, each with a fixed recovery policy:
//! - **Storage**: directory/read/write failures. The book stays in memory
//!   until a later flush succeeds.
//! - **Deserialization**: a persisted record is malformed. The record is
//!   pruned and the load continues.
//! - **Validation**: a book's source or current file vanished. Surfaced as
//!   `is_damaged` plus an alert, never thrown.
//! - **Playback**: the engine could not play an item. Logged only.

use crate::ids::Uid;
use std::fmt;
use thiserror::Error;

/// Fault family, used to pick a recovery action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Storage,
    Deserialization,
    Validation,
    Playback,
    /// Caller passed something the domain model rejects
    Usage,
}

impl FaultKind {
    /// Returns the recovery action applied to faults of this kind
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::Storage => RecoveryAction::KeepInMemory,
            Self::Deserialization => RecoveryAction::PruneRecord,
            Self::Validation => RecoveryAction::MarkDamaged,
            Self::Playback => RecoveryAction::LogOnly,
            Self::Usage => RecoveryAction::Reject,
        }
    }
}

/// What the system does after a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Keep the book in memory and retry on the next flush
    KeepInMemory,
    /// Delete the offending record and skip it
    PruneRecord,
    /// Mark the book damaged and alert the user
    MarkDamaged,
    /// Report and leave state untouched
    LogOnly,
    /// Refuse the operation
    Reject,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepInMemory => write!(f, "keeping book in memory"),
            Self::PruneRecord => write!(f, "pruning record"),
            Self::MarkDamaged => write!(f, "marking book damaged"),
            Self::LogOnly => write!(f, "logged"),
            Self::Reject => write!(f, "rejected"),
        }
    }
}

/// Errors raised by the domain model itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid uid: '{0}'")]
    InvalidUid(String),

    #[error("Audio file {uid} does not belong to this book")]
    UnknownFile { uid: Uid },

    #[error("Index {index} out of bounds (count: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("Invalid playback rate: {0}")]
    InvalidRate(f32),
}

impl DomainError {
    pub fn fault_kind(&self) -> FaultKind {
        FaultKind::Usage
    }
}

/// Convenience type alias for Results using DomainError
pub type Result<T> = std::result::Result<T, DomainError>;
