//! Shared configuration constants for sitemirror
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Chrome user agent string sent by both the renderer and the asset fetcher
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Default browser and `Accept-Language` locale
pub const DEFAULT_LANG: &str = "en-US";

/// Seconds to let client-side scripts settle after navigation before the DOM is captured
pub const DEFAULT_SETTLE_TIMEOUT_SECS: u64 = 1;

/// Timeout in seconds for page navigation in the headless browser
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Timeout in seconds for a single asset HTTP request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum asset body size: 25MB
///
/// Bodies larger than this are rejected while streaming and the reference
/// is left pointing at the remote server.
pub const DEFAULT_MAX_ASSET_SIZE_BYTES: usize = 25 * 1024 * 1024;

/// Number of asset downloads in flight per tree level of a page
pub const DEFAULT_MAX_CONCURRENT_ASSETS: usize = 8;

/// Nesting limit for `sitemapindex` documents
pub const MAX_SITEMAP_DEPTH: usize = 4;

/// Well-known sitemap location relative to the site root
pub const SITEMAP_PATH: &str = "/sitemap.xml";

/// Asset file names keep at most this many trailing characters
pub const MAX_ASSET_NAME_CHARS: usize = 50;

/// Name used for a page whose path ends in a directory
pub const DEFAULT_PAGE_NAME: &str = "default.html";

/// Name used for an asset whose URI has no usable last segment
pub const UNKNOWN_ASSET_NAME: &str = "unknown.file";

/// Directory under the output root that holds every downloaded asset
pub const CLIENT_DIR: &str = "client";

/// Directory under the output root that holds pages in the original layout
pub const PAGES_DIR: &str = "pages";
