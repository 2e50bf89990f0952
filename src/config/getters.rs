//! Getter methods for `MirrorConfig`

use std::path::{Path, PathBuf};

use super::types::{MirrorConfig, MirrorMode, PageLayout};
use crate::fetch::RetryPolicy;
use crate::uri::CanonicalUri;

impl MirrorConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn start_url(&self) -> &CanonicalUri {
        &self.start_url
    }

    #[must_use]
    pub fn mode(&self) -> MirrorMode {
        self.mode
    }

    #[must_use]
    pub fn is_full_site(&self) -> bool {
        self.mode == MirrorMode::FullSite
    }

    #[must_use]
    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    #[must_use]
    pub fn settle_timeout_secs(&self) -> u64 {
        self.settle_timeout_secs
    }

    /// Returns the configured timeout for `page.goto()` and `page.wait_for_navigation()`.
    #[must_use]
    pub fn navigation_timeout_secs(&self) -> u64 {
        self.navigation_timeout_secs
    }

    #[must_use]
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    #[must_use]
    pub fn max_asset_size_bytes(&self) -> usize {
        self.max_asset_size_bytes
    }

    #[must_use]
    pub fn max_concurrent_assets(&self) -> usize {
        self.max_concurrent_assets
    }

    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }
}
