//! Storage abstractions for snapshot persistence.
//!
//! Exactly one snapshot exists at a time. It is read once at the start of a
//! cycle and replaced wholesale at the end.
//!
//! ```text
//! data/
//! └── data.json      # {"channels": [...], "videos": [...]}
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted snapshot.
    ///
    /// A missing or unreadable snapshot is an empty one.
    async fn load(&self) -> Result<Snapshot>;

    /// Replace the persisted snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
