//! Headless rendering of pages to HTML.
//!
//! The pipeline only needs "URL in, settled HTML out"; [`Renderer`] is that
//! seam. [`ChromeRenderer`] drives Chromium through chromiumoxide.

pub mod browser_setup;
pub mod chrome;
pub mod page_timeout;

use std::future::Future;
use std::pin::Pin;

use crate::uri::CanonicalUri;

pub use browser_setup::{BrowserLaunchOptions, launch_browser};
pub use chrome::ChromeRenderer;
pub use page_timeout::with_page_timeout;

/// Boxed future returned by [`Renderer::render`]
pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

/// Produce the serialized DOM of a page after client-side scripts ran.
pub trait Renderer: Send + Sync {
    /// `settle_secs` is how long to let the page run after navigation.
    fn render<'a>(&'a self, uri: &'a CanonicalUri, settle_secs: u64) -> RenderFuture<'a>;
}
