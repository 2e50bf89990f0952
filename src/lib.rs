//! Website mirroring: render pages in headless Chromium, localise their
//! scripts, stylesheets, images and fonts, and save a copy that works
//! offline.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use kodegen_tools_sitemirror::{MirrorConfig, mirror};
//!
//! let config = MirrorConfig::builder()
//!     .output_dir("./mirror")
//!     .start_url("example.com")
//!     .full_site(true)
//!     .build()?;
//! let report = mirror(config).await?;
//! println!("{} page(s) saved", report.pages_saved);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod page;
pub mod render;
pub mod resource;
pub mod rewrite;
pub mod session;
pub mod site;
pub mod uri;
pub mod utils;

use std::sync::Arc;

pub use cache::{CacheEntry, ResourceCache};
pub use config::{MirrorConfig, MirrorConfigBuilder, MirrorMode, PageLayout};
pub use error::{MirrorError, MirrorResult};
pub use fetch::{FetchError, Fetcher, HttpFetcher, RetryPolicy};
pub use output::OutputStore;
pub use page::Page;
pub use render::{ChromeRenderer, Renderer};
pub use resource::Resource;
pub use session::MirrorSession;
pub use site::{CrawlState, MirrorReport, SiteCrawler};
pub use uri::CanonicalUri;

/// Mirror the site described by `config` with the network-backed fetcher
/// and a Chromium renderer.
///
/// The output directory is created if missing. The browser is shut down
/// before returning, whether the run succeeded or not.
pub async fn mirror(config: MirrorConfig) -> Result<MirrorReport, MirrorError> {
    tokio::fs::create_dir_all(config.output_dir())
        .await
        .map_err(|source| MirrorError::Save {
            path: config.output_dir().to_path_buf(),
            source,
        })?;

    let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
    let renderer = Arc::new(ChromeRenderer::from_config(&config));

    let session = MirrorSession::new(config, fetcher, renderer.clone());
    let result = SiteCrawler::new(&session).run().await;
    renderer.shutdown().await;
    result
}

/// Mirror with caller-supplied network collaborators.
pub async fn mirror_with(
    config: MirrorConfig,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
) -> Result<MirrorReport, MirrorError> {
    let session = MirrorSession::new(config, fetcher, renderer);
    SiteCrawler::new(&session).run().await
}
