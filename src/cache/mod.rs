//! Run-scoped deduplicating cache keyed by canonical URI.
//!
//! Every canonical URI is loaded (fetched, rewritten, saved) at most once per
//! run, no matter how many pages or stylesheets reference it or how many asset
//! tasks ask for it concurrently. The check-load-install sequence is serialized
//! per key by an async mutex; lookups of installed entries never block.
//!
//! A run owns two independent instances: one for assets and one for pages.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::MirrorError;
use crate::uri::CanonicalUri;

/// Where a resource ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Output path relative to the mirror root, or the remote URI when not persisted
    pub output_path: String,
    /// Bytes are on disk at `output_path`
    pub persisted: bool,
}

impl CacheEntry {
    pub fn persisted(output_path: impl Into<String>) -> Self {
        Self {
            output_path: output_path.into(),
            persisted: true,
        }
    }

    /// Seen and fetched, but intentionally left on the remote server.
    pub fn remote(uri: &CanonicalUri) -> Self {
        Self {
            output_path: uri.to_string(),
            persisted: false,
        }
    }
}

/// Result of a non-waiting load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    Ready(CacheEntry),
    /// Another task is loading this URI right now
    InFlight,
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: DashMap<CanonicalUri, CacheEntry>,
    failures: DashMap<CanonicalUri, String>,
    locks: DashMap<CanonicalUri, Arc<Mutex<()>>>,
    loads: AtomicUsize,
}

impl ResourceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, uri: &CanonicalUri) -> Option<CacheEntry> {
        self.entries.get(uri).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, uri: &CanonicalUri) -> bool {
        self.entries.contains_key(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose bytes are on disk
    #[must_use]
    pub fn persisted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.value().persisted).count()
    }

    /// Number of loader invocations so far
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Snapshot of all installed entries
    pub fn entries(&self) -> Vec<(CanonicalUri, CacheEntry)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Install an entry and return the one that is in effect afterwards.
    ///
    /// First writer wins. The only replacement allowed is upgrading a
    /// `persisted=false` entry to `persisted=true`.
    pub fn record(&self, uri: &CanonicalUri, entry: CacheEntry) -> CacheEntry {
        match self.entries.entry(uri.clone()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().persisted && entry.persisted {
                    occupied.insert(entry.clone());
                    entry
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry.clone());
                entry
            }
        }
    }

    /// Load `uri` through `load` unless a satisfying entry exists.
    ///
    /// Concurrent callers for the same key wait for the first one and then
    /// share its entry. A failed load is remembered and reported to later
    /// callers without running `load` again.
    pub async fn fetch_once<F, Fut>(
        &self,
        uri: &CanonicalUri,
        require_persisted: bool,
        load: F,
    ) -> Result<CacheEntry, MirrorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry, MirrorError>>,
    {
        if let Some(settled) = self.settled(uri, require_persisted) {
            return settled;
        }

        let lock = self.key_lock(uri);
        let _guard = lock.lock().await;
        self.load_locked(uri, require_persisted, load).await
    }

    /// Like [`fetch_once`](Self::fetch_once), but returns [`Claim::InFlight`]
    /// instead of waiting when another task holds the key.
    ///
    /// Used for stylesheet-to-stylesheet references, where waiting could
    /// deadlock two stylesheets that import each other.
    pub async fn try_fetch_once<F, Fut>(
        &self,
        uri: &CanonicalUri,
        require_persisted: bool,
        load: F,
    ) -> Result<Claim, MirrorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry, MirrorError>>,
    {
        if let Some(settled) = self.settled(uri, require_persisted) {
            return settled.map(Claim::Ready);
        }

        let lock = self.key_lock(uri);
        let Ok(_guard) = lock.try_lock() else {
            return Ok(Claim::InFlight);
        };
        self.load_locked(uri, require_persisted, load)
            .await
            .map(Claim::Ready)
    }

    fn settled(
        &self,
        uri: &CanonicalUri,
        require_persisted: bool,
    ) -> Option<Result<CacheEntry, MirrorError>> {
        if let Some(reason) = self.failures.get(uri) {
            return Some(Err(MirrorError::Unavailable {
                uri: uri.to_string(),
                reason: reason.value().clone(),
            }));
        }
        self.lookup(uri)
            .filter(|entry| entry.persisted || !require_persisted)
            .map(Ok)
    }

    async fn load_locked<F, Fut>(
        &self,
        uri: &CanonicalUri,
        require_persisted: bool,
        load: F,
    ) -> Result<CacheEntry, MirrorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry, MirrorError>>,
    {
        // Re-check: the previous holder may have installed it.
        if let Some(settled) = self.settled(uri, require_persisted) {
            return settled;
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        match load().await {
            Ok(entry) => Ok(self.record(uri, entry)),
            Err(e) => {
                self.failures.insert(uri.clone(), e.to_string());
                Err(e)
            }
        }
    }

    fn key_lock(&self, uri: &CanonicalUri) -> Arc<Mutex<()>> {
        self.locks.entry(uri.clone()).or_default().clone()
    }
}
