//! Type-safe builder for `MirrorConfig` using the typestate pattern
//!
//! The output directory and start URL must be supplied, in that order, before
//! `build()` becomes available.

use anyhow::{Context, Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{MirrorConfig, MirrorMode, PageLayout};
use crate::fetch::RetryPolicy;
use crate::uri::CanonicalUri;
use crate::utils::constants::{
    CHROME_USER_AGENT, DEFAULT_LANG, DEFAULT_MAX_ASSET_SIZE_BYTES, DEFAULT_MAX_CONCURRENT_ASSETS,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SETTLE_TIMEOUT_SECS,
};

/// Upper bound for `max_concurrent_assets`
const MAX_CONCURRENT_ASSETS_LIMIT: usize = 64;

// Type states for the builder
pub struct WithOutputDir;
pub struct WithStartUrl;

pub struct MirrorConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) start_url: Option<String>,
    pub(crate) mode: MirrorMode,
    pub(crate) layout: PageLayout,
    pub(crate) proxy: Option<String>,
    pub(crate) user_agent: String,
    pub(crate) lang: String,
    pub(crate) settle_timeout_secs: u64,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) max_asset_size_bytes: usize,
    pub(crate) max_concurrent_assets: usize,
    pub(crate) retry: RetryPolicy,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for MirrorConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            start_url: None,
            mode: MirrorMode::SinglePage,
            layout: PageLayout::Flat,
            proxy: None,
            user_agent: CHROME_USER_AGENT.to_string(),
            lang: DEFAULT_LANG.to_string(),
            settle_timeout_secs: DEFAULT_SETTLE_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_asset_size_bytes: DEFAULT_MAX_ASSET_SIZE_BYTES,
            max_concurrent_assets: DEFAULT_MAX_CONCURRENT_ASSETS,
            retry: RetryPolicy::default(),
            headless: true,
            chrome_data_dir: None,
            _phantom: PhantomData,
        }
    }
}

impl MirrorConfig {
    /// Create a builder for configuring a `MirrorConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> MirrorConfigBuilder<()> {
        MirrorConfigBuilder::default()
    }
}

impl<State> MirrorConfigBuilder<State> {
    fn into_state<Next>(self) -> MirrorConfigBuilder<Next> {
        MirrorConfigBuilder {
            output_dir: self.output_dir,
            start_url: self.start_url,
            mode: self.mode,
            layout: self.layout,
            proxy: self.proxy,
            user_agent: self.user_agent,
            lang: self.lang,
            settle_timeout_secs: self.settle_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            request_timeout_secs: self.request_timeout_secs,
            max_asset_size_bytes: self.max_asset_size_bytes,
            max_concurrent_assets: self.max_concurrent_assets,
            retry: self.retry,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl MirrorConfigBuilder<()> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> MirrorConfigBuilder<WithOutputDir> {
        self.output_dir = Some(dir.into());
        self.into_state()
    }
}

impl MirrorConfigBuilder<WithOutputDir> {
    pub fn start_url(mut self, url: impl Into<String>) -> MirrorConfigBuilder<WithStartUrl> {
        let url_string = url.into();
        let trimmed = url_string.trim();

        // Normalize URL: add https:// if no scheme is present
        let lower = trimmed.to_ascii_lowercase();
        let normalized_url = if lower.starts_with("http://") || lower.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        self.start_url = Some(normalized_url);
        self.into_state()
    }
}

// Build method only available when all required fields are set
impl MirrorConfigBuilder<WithStartUrl> {
    pub fn build(self) -> Result<MirrorConfig> {
        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output_dir is required"))?;
        let output_dir = std::path::absolute(&output_dir).with_context(|| {
            format!("Cannot resolve output directory {}", output_dir.display())
        })?;

        let start_url = self
            .start_url
            .ok_or_else(|| anyhow!("start_url is required"))?;
        let start_url = CanonicalUri::parse(&start_url)
            .with_context(|| format!("Invalid start URL: {start_url}"))?;

        if let Some(proxy) = &self.proxy {
            validate_proxy(proxy)?;
        }

        if self.lang.trim().is_empty() {
            return Err(anyhow!("lang must not be empty"));
        }

        Ok(MirrorConfig {
            output_dir,
            start_url,
            mode: self.mode,
            layout: self.layout,
            proxy: self.proxy,
            user_agent: self.user_agent,
            lang: self.lang,
            settle_timeout_secs: self.settle_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs.max(1),
            request_timeout_secs: self.request_timeout_secs.max(1),
            max_asset_size_bytes: self.max_asset_size_bytes,
            max_concurrent_assets: self
                .max_concurrent_assets
                .clamp(1, MAX_CONCURRENT_ASSETS_LIMIT),
            retry: self.retry,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
        })
    }
}

/// Proxy addresses are `host:port` with a numeric port.
fn validate_proxy(proxy: &str) -> Result<()> {
    let (host, port) = proxy
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Proxy must be host:port, got `{proxy}`"))?;
    if host.is_empty() {
        return Err(anyhow!("Proxy host is empty in `{proxy}`"));
    }
    port.parse::<u16>()
        .with_context(|| format!("Proxy port is not a number in `{proxy}`"))?;
    Ok(())
}

// Builder methods available at any state
impl<State> MirrorConfigBuilder<State> {
    #[must_use]
    pub fn mode(mut self, mode: MirrorMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn full_site(self, full: bool) -> Self {
        self.mode(if full {
            MirrorMode::FullSite
        } else {
            MirrorMode::SinglePage
        })
    }

    #[must_use]
    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Route browser and asset traffic through `host:port`
    #[must_use]
    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Seconds to let client-side scripts settle before capturing the DOM
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_sitemirror::config::MirrorConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = MirrorConfig::builder()
    ///     .output_dir("./mirror")
    ///     .start_url("https://example.com")
    ///     .settle_timeout_secs(3)
    ///     .build()?;
    /// assert_eq!(config.settle_timeout_secs(), 3);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn settle_timeout_secs(mut self, secs: u64) -> Self {
        self.settle_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_asset_size_bytes(mut self, bytes: usize) -> Self {
        self.max_asset_size_bytes = bytes;
        self
    }

    /// Set the per-level fan-out for asset downloads (clamped to 1-64)
    #[must_use]
    pub fn max_concurrent_assets(mut self, n: usize) -> Self {
        self.max_concurrent_assets = n;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.chrome_data_dir = dir;
        self
    }
}
