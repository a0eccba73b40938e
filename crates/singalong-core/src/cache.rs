//! Resolution cache.
//!
//! Memoizes successful name → id resolutions for the lifetime of the
//! process. Every key carries the credential that performed the lookup, so
//! two credentials never observe each other's entries.
//!
//! Each key owns a [`OnceCell`] slot. Concurrent lookups of the same key
//! wait on the slot instead of racing upstream; a failed resolution leaves
//! the slot empty, so the next caller resolves again. Entries are written at
//! most once and never invalidated.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::credential::Credential;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `(group name, credential)` → group id.
    Group {
        group: String,
        credential: Credential,
    },
    /// `(project name, enclosing group name, credential)` → project id.
    Project {
        project: String,
        group: String,
        credential: Credential,
    },
}

impl CacheKey {
    /// Key for a group lookup.
    #[must_use]
    pub fn group(group: &str, credential: &Credential) -> Self {
        Self::Group {
            group: group.to_owned(),
            credential: credential.clone(),
        }
    }

    /// Key for a project lookup inside `group`.
    #[must_use]
    pub fn project(project: &str, group: &str, credential: &Credential) -> Self {
        Self::Project {
            project: project.to_owned(),
            group: group.to_owned(),
            credential: credential.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Group { .. } => "group",
            Self::Project { .. } => "project",
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Group { group, .. } => group,
            Self::Project { project, .. } => project,
        }
    }
}

/// Write-once map from [`CacheKey`] to upstream id.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<CacheKey, Arc<OnceCell<u64>>>>,
}

impl ResolutionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached id for `key`, or run `resolve` and cache its result.
    ///
    /// `resolve` is only invoked on a miss. Its error is returned unchanged
    /// and nothing is stored.
    ///
    /// # Errors
    ///
    /// Whatever `resolve` returns.
    pub async fn get_or_resolve<F, Fut, E>(&self, key: CacheKey, resolve: F) -> Result<u64, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, E>>,
    {
        let slot = self.slot(&key);

        if let Some(id) = slot.get() {
            debug!(kind = key.kind(), name = key.name(), id, "resolution cache hit");
            return Ok(*id);
        }

        debug!(kind = key.kind(), name = key.name(), "resolution cache miss");
        let pending = PendingSlot {
            cache: self,
            key: &key,
            slot: &slot,
        };
        let resolved = slot.get_or_try_init(resolve).await.copied();
        drop(pending);
        resolved
    }

    /// Look up `key` without resolving.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<u64> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|slot| slot.get().copied())
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }

    /// Whether no entry has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &CacheKey) -> Arc<OnceCell<u64>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Drop a slot that is still empty once nobody waits on it, so failed or
    /// abandoned lookups for arbitrary names do not accumulate.
    fn discard_empty(&self, key: &CacheKey, slot: &Arc<OnceCell<u64>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference is the map's, one is the caller's.
        let stale = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) <= 2
        });
        if stale {
            slots.remove(key);
        }
    }
}

/// Held across a resolution. Dropping it, on failure or when the caller's
/// future is cancelled, removes the slot if it is still empty.
struct PendingSlot<'a> {
    cache: &'a ResolutionCache,
    key: &'a CacheKey,
    slot: &'a Arc<OnceCell<u64>>,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.cache.discard_empty(self.key, self.slot);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn cred(token: &str) -> Credential {
        Credential::new(token)
    }

    #[tokio::test]
    async fn hit_skips_resolver() {
        let cache = ResolutionCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let id = cache
                .get_or_resolve(CacheKey::group("PNCKS", &cred("t")), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(14_660_398)
                })
                .await
                .unwrap();
            assert_eq!(id, 14_660_398);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = ResolutionCache::new();
        let key = CacheKey::group("PNCKS", &cred("t"));

        let first = cache
            .get_or_resolve(key.clone(), || async { Err::<u64, _>("unauthorized") })
            .await;
        assert_eq!(first, Err("unauthorized"));
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key), None);

        let second = cache
            .get_or_resolve(key.clone(), || async { Ok::<_, &str>(5) })
            .await;
        assert_eq!(second, Ok(5));
        assert_eq!(cache.get(&key), Some(5));
    }

    #[tokio::test]
    async fn abandoned_lookup_leaves_no_slot() {
        let cache = ResolutionCache::new();
        let key = CacheKey::project("anything", "PNCKS", &cred("t"));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            cache.get_or_resolve(key.clone(), || std::future::pending::<Result<u64, ()>>()),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(cache.slots.lock().unwrap().is_empty());
        assert_eq!(
            cache.get_or_resolve(key, || async { Ok::<_, ()>(7) }).await,
            Ok(7)
        );
    }

    #[tokio::test]
    async fn failed_lookup_leaves_no_slot() {
        let cache = ResolutionCache::new();
        let key = CacheKey::project("nope", "PNCKS", &cred("t"));
        let _ = cache.get_or_resolve(key, || async { Err::<u64, _>(()) }).await;
        assert!(cache.slots.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_success_wins() {
        let cache = ResolutionCache::new();
        let key = CacheKey::project("healthcheck", "PNCKS", &cred("t"));

        cache
            .get_or_resolve(key.clone(), || async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        let again = cache
            .get_or_resolve(key, || async { Ok::<_, ()>(2) })
            .await
            .unwrap();
        assert_eq!(again, 1);
    }

    #[tokio::test]
    async fn credentials_are_isolated() {
        let cache = ResolutionCache::new();

        cache
            .get_or_resolve(CacheKey::group("PNCKS", &cred("alice")), || async {
                Ok::<_, ()>(1)
            })
            .await
            .unwrap();

        assert_eq!(cache.get(&CacheKey::group("PNCKS", &cred("bob"))), None);

        let bob = cache
            .get_or_resolve(CacheKey::group("PNCKS", &cred("bob")), || async {
                Ok::<_, ()>(2)
            })
            .await
            .unwrap();
        assert_eq!(bob, 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn group_and_project_keys_do_not_collide() {
        let cache = ResolutionCache::new();
        let c = cred("t");

        cache
            .get_or_resolve(CacheKey::group("PNCKS", &c), || async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        assert_eq!(cache.get(&CacheKey::project("PNCKS", "PNCKS", &c)), None);
    }

    #[tokio::test]
    async fn concurrent_lookups_resolve_once() {
        let cache = Arc::new(ResolutionCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_resolve(CacheKey::group("PNCKS", &Credential::new("t")), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
