//! Core configuration types for site mirroring
//!
//! This module contains the main `MirrorConfig` struct and the enums that
//! select what gets mirrored and how pages are laid out on disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fetch::RetryPolicy;
use crate::uri::CanonicalUri;

/// How much of the site a run mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MirrorMode {
    /// Only the start page and its assets
    #[default]
    SinglePage,
    /// Every page listed in the sitemap (or linked from the start page)
    FullSite,
}

/// Where page files go under the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageLayout {
    /// `/docs/intro` becomes `{output}/docs-intro.html`
    #[default]
    Flat,
    /// `/docs/intro` becomes `{output}/pages/docs/intro.html`
    Original,
}

/// Main configuration struct for a mirroring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Output directory for the mirror.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) output_dir: PathBuf,
    pub(crate) start_url: CanonicalUri,
    pub(crate) mode: MirrorMode,
    pub(crate) layout: PageLayout,

    /// `host:port` of an HTTP proxy used by both the browser and the fetcher
    pub(crate) proxy: Option<String>,
    pub(crate) user_agent: String,
    /// Browser locale and `Accept-Language` value
    pub(crate) lang: String,

    /// Seconds to wait after navigation before the DOM is captured
    ///
    /// Gives client-side scripts time to finish building the page.
    ///
    /// Default: 1 second
    pub(crate) settle_timeout_secs: u64,

    /// Timeout in seconds for `page.goto()` and `page.wait_for_navigation()`
    ///
    /// Default: 30 seconds
    pub(crate) navigation_timeout_secs: u64,

    /// Timeout in seconds for a single asset request
    ///
    /// Default: 30 seconds
    pub(crate) request_timeout_secs: u64,

    /// Assets larger than this are left on the remote server
    pub(crate) max_asset_size_bytes: usize,

    /// Asset downloads in flight per tree level of a page
    /// Default: 8, Range: 1-64
    pub(crate) max_concurrent_assets: usize,

    /// Backoff policy shared by fetch, render and save
    pub(crate) retry: RetryPolicy,

    pub(crate) headless: bool,

    /// Chrome user data directory path for browser profile isolation
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}
