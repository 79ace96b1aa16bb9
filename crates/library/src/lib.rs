//! audioshelf library management
//!
//! Turns scanner output into books and keeps them honest:
//! - [`FolderToBookMapper`] / [`PlaylistToBookMapper`] convert descriptors,
//!   reusing books the repository already knows
//! - [`BookFactory`] reconciles a scan with the playlist
//! - [`MediaLibraryReloader`] rebuilds books whose playlist changed
//! - [`PersistenceValidator`] marks books damaged when their source vanishes
//! - [`LibraryManager`] wires one session together from the config

pub mod error;
pub mod factory;
pub mod manager;
pub mod mapper;
pub mod recovery;
pub mod validation;

pub use error::{LibraryError, LibraryResult};
pub use factory::BookFactory;
pub use manager::LibraryManager;
pub use mapper::{FolderToBookMapper, PlaylistToBookMapper, DURATION_TOLERANCE};
pub use recovery::MediaLibraryReloader;
pub use validation::{
    DamageReason, PersistenceValidator, ValidationAlert, ValidationOutcome, ValidationSummary,
};
