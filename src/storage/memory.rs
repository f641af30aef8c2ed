//! In-memory seen-set backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::SeenSet;
use crate::storage::SeenStore;

/// Seen-set held in memory, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    state: Mutex<SeenSet>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seen(seen: SeenSet) -> Self {
        Self {
            state: Mutex::new(seen),
            ..Self::default()
        }
    }

    /// Current persisted snapshot.
    pub fn snapshot(&self) -> SeenSet {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn load(&self) -> SeenSet {
        self.snapshot()
    }

    async fn save(&self, seen: &SeenSet) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::persist("memory store is read-only"));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::persist("memory store lock poisoned"))?;
        *state = seen.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
