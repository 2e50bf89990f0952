//! The mirror directory on disk.
//!
//! `OutputStore` owns the single critical section of a run: the registry of
//! issued output paths and every file write go through one async mutex, so
//! collision checks, reservations and "Saved ..." log lines never interleave.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::paths::{AssetKind, asset_file_name, asset_path, page_file_name, with_suffix};
use crate::config::PageLayout;
use crate::error::MirrorError;
use crate::fetch::RetryPolicy;
use crate::uri::CanonicalUri;

#[derive(Debug, Default)]
struct Registry {
    /// Asset URI to its allocated path, so allocation is idempotent per URI
    assets: HashMap<CanonicalUri, String>,
    /// Every path handed out this run, assets and pages alike
    issued: HashSet<String>,
}

#[derive(Debug)]
pub struct OutputStore {
    root: PathBuf,
    layout: PageLayout,
    retry: RetryPolicy,
    registry: Mutex<Registry>,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>, layout: PageLayout, retry: RetryPolicy) -> Self {
        Self {
            root: root.into(),
            layout,
            retry,
            registry: Mutex::new(Registry::default()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Absolute path of a file given relative to the mirror root.
    #[must_use]
    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Path for an asset under `client/{kind}/`.
    ///
    /// The same URI always gets the same path. Different URIs with the same
    /// file name get `-1`, `-2`, ... suffixes in allocation order. Files left
    /// over from earlier runs are overwritten, not avoided.
    pub async fn allocate_asset(&self, uri: &CanonicalUri, kind: AssetKind) -> String {
        let mut registry = self.registry.lock().await;
        if let Some(existing) = registry.assets.get(uri) {
            return existing.clone();
        }

        let base = asset_path(kind, &asset_file_name(uri));
        let mut candidate = base.clone();
        let mut n = 0;
        while registry.issued.contains(&candidate) {
            n += 1;
            candidate = with_suffix(&base, n);
        }

        registry.issued.insert(candidate.clone());
        registry.assets.insert(uri.clone(), candidate.clone());
        candidate
    }

    /// Reserve a fresh page path for `uri` in the configured layout.
    ///
    /// Never returns a path that exists on disk at call time or that was issued
    /// earlier in this run; repeated calls for the same name yield `page.html`,
    /// `page-1.html`, `page-2.html`, ...
    pub async fn reserve_page(&self, uri: &CanonicalUri) -> String {
        let mut registry = self.registry.lock().await;

        let base = page_file_name(uri, self.layout);
        let mut candidate = base.clone();
        let mut n = 0;
        while registry.issued.contains(&candidate) || self.exists_on_disk(&candidate).await {
            n += 1;
            candidate = with_suffix(&base, n);
        }

        registry.issued.insert(candidate.clone());
        candidate
    }

    /// Create parent directories and write `bytes` at `relative`.
    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, MirrorError> {
        let _registry = self.registry.lock().await;
        let path = self.absolute(relative);

        let label = format!("save {relative}");
        let result = self
            .retry
            .run(&label, || async {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, bytes).await
            })
            .await;

        match result {
            Ok(()) => {
                log::info!("Saved resource {}", path.display());
                Ok(path)
            }
            Err(exhausted) => Err(MirrorError::Save {
                path,
                source: exhausted.error,
            }),
        }
    }

    async fn exists_on_disk(&self, relative: &str) -> bool {
        tokio::fs::try_exists(self.absolute(relative))
            .await
            .unwrap_or(false)
    }
}
