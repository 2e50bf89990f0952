use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chromiumoxide::Browser;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::browser_setup::{BrowserLaunchOptions, launch_browser};
use super::page_timeout::with_page_timeout;
use super::{RenderFuture, Renderer};
use crate::config::MirrorConfig;
use crate::uri::CanonicalUri;

struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
}

/// Renderer backed by a lazily launched Chromium instance.
///
/// One browser serves the whole run; pages are opened in fresh tabs and
/// closed once their DOM has been captured.
pub struct ChromeRenderer {
    options: BrowserLaunchOptions,
    navigation_timeout_secs: u64,
    browser: Mutex<Option<LaunchedBrowser>>,
}

impl ChromeRenderer {
    #[must_use]
    pub fn new(options: BrowserLaunchOptions, navigation_timeout_secs: u64) -> Self {
        Self {
            options,
            navigation_timeout_secs,
            browser: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::new(
            BrowserLaunchOptions::from(config),
            config.navigation_timeout_secs(),
        )
    }

    async fn render_page(&self, uri: &CanonicalUri, settle_secs: u64) -> Result<String> {
        let mut guard = self.browser.lock().await;
        if guard.is_none() {
            let (browser, handler, user_data_dir) = launch_browser(&self.options).await?;
            *guard = Some(LaunchedBrowser {
                browser,
                handler,
                user_data_dir,
            });
        }
        let launched = guard
            .as_ref()
            .ok_or_else(|| anyhow!("Browser is not running"))?;

        let timeout = self.navigation_timeout_secs;
        let page = with_page_timeout(
            async {
                launched
                    .browser
                    .new_page(uri.as_str())
                    .await
                    .context("Failed to open page")
            },
            timeout,
            "page.goto()",
        )
        .await?;

        let captured = async {
            with_page_timeout(
                async {
                    page.wait_for_navigation()
                        .await
                        .context("Navigation failed")?;
                    Ok(())
                },
                timeout,
                "page.wait_for_navigation()",
            )
            .await?;

            if settle_secs > 0 {
                tokio::time::sleep(Duration::from_secs(settle_secs)).await;
            }

            with_page_timeout(
                async { page.content().await.context("Failed to read page content") },
                timeout,
                "page.content()",
            )
            .await
        }
        .await;

        if let Err(e) = page.close().await {
            debug!("Failed to close tab for {uri}: {e}");
        }

        let html = captured?;
        debug!("Rendered {uri} ({} bytes)", html.len());
        Ok(html)
    }

    /// Close the browser if it was launched.
    pub async fn shutdown(&self) {
        let Some(mut launched) = self.browser.lock().await.take() else {
            return;
        };
        if let Err(e) = launched.browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        if let Err(e) = launched.browser.wait().await {
            warn!("Failed to wait for browser exit: {e}");
        }
        launched.handler.abort();
        info!(
            "Browser shut down (profile {})",
            launched.user_data_dir.display()
        );
    }
}

impl Renderer for ChromeRenderer {
    fn render<'a>(&'a self, uri: &'a CanonicalUri, settle_secs: u64) -> RenderFuture<'a> {
        Box::pin(self.render_page(uri, settle_secs))
    }
}
