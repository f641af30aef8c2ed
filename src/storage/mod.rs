//! Storage abstractions for the seen-set.
//!
//! The seen-set is a single JSON array of post tokens:
//!
//! ```text
//! sent_posts.json
//! ["AaBbCcDd", "EeFfGgHh", ...]
//! ```
//!
//! A missing or unreadable file is treated as an empty set.

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SeenSet;

// Re-export for convenience
pub use local::LocalSeenStore;
pub use memory::MemorySeenStore;

/// Trait for seen-set storage backends.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Load persisted identifiers.
    ///
    /// Never fails: missing, corrupt or unreadable state yields an empty set.
    async fn load(&self) -> SeenSet;

    /// Overwrite persisted state with the full set.
    async fn save(&self, seen: &SeenSet) -> Result<()>;
}
