//! Per-run state shared by every page of a mirroring run.

use std::sync::Arc;

use crate::cache::ResourceCache;
use crate::config::MirrorConfig;
use crate::fetch::Fetcher;
use crate::output::OutputStore;
use crate::render::Renderer;

/// Owns the caches, the output store and the network collaborators for one run.
///
/// Nothing here is process-global: two sessions never share cache entries or
/// reserved paths.
pub struct MirrorSession {
    config: MirrorConfig,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
    assets: ResourceCache,
    pages: ResourceCache,
    store: OutputStore,
}

impl MirrorSession {
    pub fn new(
        config: MirrorConfig,
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let store = OutputStore::new(
            config.output_dir(),
            config.layout(),
            config.retry().clone(),
        );
        Self {
            config,
            fetcher,
            renderer,
            assets: ResourceCache::new(),
            pages: ResourceCache::new(),
            store,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    #[must_use]
    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    #[must_use]
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Cache of stylesheets, scripts, images and fonts
    #[must_use]
    pub fn assets(&self) -> &ResourceCache {
        &self.assets
    }

    /// Cache of pages saved this run
    #[must_use]
    pub fn pages(&self) -> &ResourceCache {
        &self.pages
    }

    #[must_use]
    pub fn store(&self) -> &OutputStore {
        &self.store
    }
}
