//! Debounced per-key lock registry.
//!
//! A key is *busy* from the moment it is claimed until a release scheduled on
//! the tokio timer fires. The release is time based: it does not know whether
//! the work the claim guarded has finished.
//!
//! Every claim carries a generation number. A release only clears the key if
//! the registry still holds that generation, so a late release from an older
//! claim cannot free a key somebody claimed again in the meantime. Released
//! keys are dropped from the map; an absent key is idle.
//!
//! The mutex is held for exactly one map access at a time. The grace period is
//! awaited outside of it, in a detached task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Proof that a key was claimed.
///
/// Handed back by [`KeyRegistry::claim`] and [`KeyRegistry::try_claim`] and
/// consumed by the release operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    key: String,
    generation: u64,
}

impl Claim {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// In-memory map of busy keys guarded by a single mutex.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    busy: Mutex<HashMap<String, u64>>,
    next_generation: AtomicU64,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently claimed. Never-seen keys are idle.
    pub fn is_busy(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Mark `key` busy unconditionally, superseding any earlier claim.
    ///
    /// Callers are expected to have checked [`is_busy`](Self::is_busy) first.
    /// The check and the claim are separate critical sections, so two callers
    /// can both see the key idle and both claim it. Use
    /// [`try_claim`](Self::try_claim) when that matters.
    pub fn claim(&self, key: &str) -> Claim {
        // Generation is taken under the lock so the map always holds the newest.
        let mut busy = self.lock();
        let generation = self.bump_generation();
        busy.insert(key.to_string(), generation);
        drop(busy);

        tracing::debug!(key, generation, "key claimed");
        Claim {
            key: key.to_string(),
            generation,
        }
    }

    /// Claim `key` only if it is idle, checking and claiming under one lock.
    ///
    /// Returns `None` without touching the current claim when the key is busy.
    pub fn try_claim(&self, key: &str) -> Option<Claim> {
        let mut busy = self.lock();
        if busy.contains_key(key) {
            tracing::debug!(key, "key already busy");
            return None;
        }

        let generation = self.bump_generation();
        busy.insert(key.to_string(), generation);
        drop(busy);

        tracing::debug!(key, generation, "key claimed");
        Some(Claim {
            key: key.to_string(),
            generation,
        })
    }

    /// Free the key held by `claim`.
    ///
    /// Returns `false` if the key was already idle or has been claimed again
    /// since; in both cases nothing changes.
    pub fn release(&self, claim: &Claim) -> bool {
        let mut busy = self.lock();
        match busy.get(&claim.key) {
            Some(&current) if current == claim.generation => {
                busy.remove(&claim.key);
                drop(busy);
                tracing::debug!(key = %claim.key, generation = claim.generation, "key released");
                true
            }
            Some(&current) => {
                tracing::debug!(
                    key = %claim.key,
                    generation = claim.generation,
                    current,
                    "stale release ignored"
                );
                false
            }
            None => false,
        }
    }

    /// Release `claim` once `delay` has elapsed, without blocking the caller.
    ///
    /// The release runs in a detached tokio task. Dropping the returned
    /// handle leaves the release scheduled; [`ReleaseHandle::cancel`] stops
    /// it. Must be called from within a tokio runtime.
    pub fn schedule_release(self: &Arc<Self>, claim: Claim, delay: Duration) -> ReleaseHandle {
        let registry = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.release(&claim);
        });
        ReleaseHandle { task }
    }

    /// Number of keys currently busy.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn bump_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    // A panic while holding the lock cannot leave the map half-written, so
    // poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a scheduled release.
#[derive(Debug)]
pub struct ReleaseHandle {
    task: JoinHandle<()>,
}

impl ReleaseHandle {
    /// Stop the release from firing. No effect once it has fired.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the release has fired or was cancelled.
    pub async fn wait(self) {
        // A cancelled task reports a JoinError; either way nothing is pending.
        let _ = self.task.await;
    }
}
