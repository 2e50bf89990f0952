//! Test utilities shared by the sitemirror integration tests.
//!
//! Nothing here touches the network or launches a browser: pages come from
//! [`StaticRenderer`] and every other byte from [`MockFetcher`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use kodegen_tools_sitemirror::fetch::{FetchError, FetchFuture, Fetcher};
use kodegen_tools_sitemirror::render::{RenderFuture, Renderer};
use kodegen_tools_sitemirror::{CanonicalUri, MirrorConfig, MirrorSession, RetryPolicy};

/// In-memory fetcher that records how often each URI was requested.
#[derive(Default)]
pub struct MockFetcher {
    routes: HashMap<String, Vec<u8>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    delays: HashMap<String, Duration>,
}

#[allow(dead_code)]
impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(uri.to_string(), body.into());
        self
    }

    /// Sleep before answering, so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep before answering `uri` only; overrides [`with_delay`](Self::with_delay).
    pub fn with_delay_for(mut self, uri: &str, delay: Duration) -> Self {
        self.delays.insert(uri.to_string(), delay);
        self
    }

    pub fn hits(&self, uri: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .get(uri)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

impl Fetcher for MockFetcher {
    fn fetch<'a>(&'a self, uri: &'a CanonicalUri) -> FetchFuture<'a> {
        Box::pin(async move {
            *self
                .hits
                .lock()
                .unwrap()
                .entry(uri.to_string())
                .or_default() += 1;
            if let Some(delay) = self.delays.get(uri.as_str()).copied().or(self.delay) {
                tokio::time::sleep(delay).await;
            }
            self.routes
                .get(uri.as_str())
                .cloned()
                .ok_or(FetchError::Status { status: 404 })
        })
    }
}

/// Renderer that serves fixed HTML per URI.
#[derive(Default)]
pub struct StaticRenderer {
    pages: HashMap<String, String>,
    renders: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, html: impl Into<String>) -> Self {
        self.pages.insert(uri.to_string(), html.into());
        self
    }

    /// URIs rendered so far, in order
    pub fn rendered(&self) -> Vec<String> {
        self.renders.lock().unwrap().clone()
    }
}

impl Renderer for StaticRenderer {
    fn render<'a>(&'a self, uri: &'a CanonicalUri, _settle_secs: u64) -> RenderFuture<'a> {
        Box::pin(async move {
            self.renders.lock().unwrap().push(uri.to_string());
            self.pages
                .get(uri.as_str())
                .cloned()
                .ok_or_else(|| anyhow!("page crashed while loading {uri}"))
        })
    }
}

/// Config writing into `dir`, with retries disabled so failures are immediate.
#[allow(dead_code)]
pub fn test_config(dir: &Path, start_url: &str, full_site: bool) -> MirrorConfig {
    MirrorConfig::builder()
        .output_dir(dir)
        .start_url(start_url)
        .full_site(full_site)
        .retry(RetryPolicy::none())
        .build()
        .expect("Failed to create test config")
}

#[allow(dead_code)]
pub fn session(
    config: MirrorConfig,
    fetcher: &Arc<MockFetcher>,
    renderer: &Arc<StaticRenderer>,
) -> MirrorSession {
    MirrorSession::new(config, fetcher.clone(), renderer.clone())
}

#[allow(dead_code)]
pub fn uri(s: &str) -> CanonicalUri {
    CanonicalUri::parse(s).expect("valid test URI")
}

/// Creates a test HTML document with the given head and body markup
#[allow(dead_code)]
pub fn create_test_html(title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    {head}
</head>
<body>
    {body}
</body>
</html>"#,
        html_escape::encode_text(title),
    )
}

#[allow(dead_code)]
pub fn read(dir: &Path, relative: &str) -> String {
    let path = dir.join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Every file under `dir`, relative path to contents, sorted by path.
#[allow(dead_code)]
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(root, &path, out);
            } else {
                let bytes = std::fs::read(&path).unwrap();
                out.push((path.strip_prefix(root).unwrap().to_path_buf(), bytes));
            }
        }
    }
    let mut out = Vec::new();
    visit(dir, dir, &mut out);
    out.sort();
    out
}
