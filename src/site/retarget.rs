//! Point anchors between saved pages at their local files.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow};
use lol_html::{HtmlRewriter, Settings, element};

use crate::output::{OutputStore, relative_ref};
use crate::uri::{CanonicalUri, resolve};

/// A page written during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPage {
    pub uri: CanonicalUri,
    /// Relative to the mirror root
    pub output_path: String,
}

/// Lookup from link targets to saved page files.
#[derive(Debug, Default)]
pub struct LinkTargets {
    /// Absolute form, root-relative path and path without leading slash
    raw: HashMap<String, String>,
    canonical: HashMap<CanonicalUri, String>,
}

impl LinkTargets {
    pub fn new(pages: &[SavedPage]) -> Self {
        let mut targets = Self::default();
        for page in pages {
            let path_and_query = page.uri.path_and_query();
            let bare = path_and_query.trim_start_matches('/').to_string();
            let mut keys = vec![page.uri.to_string(), path_and_query];
            if !bare.is_empty() {
                keys.push(bare);
            }
            for key in keys {
                targets
                    .raw
                    .entry(key)
                    .or_insert_with(|| page.output_path.clone());
            }
            targets
                .canonical
                .entry(page.uri.clone())
                .or_insert_with(|| page.output_path.clone());
        }
        targets
    }

    /// Saved file `href` points at, if any. `href` must not carry a fragment.
    ///
    /// The resolved form wins; the raw forms only catch hrefs whose resolution
    /// names no saved page.
    pub fn target(&self, href: &str, base: &CanonicalUri) -> Option<&str> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        if let Ok(resolved) = resolve(href, base)
            && let Some(path) = self.canonical.get(&resolved.uri)
        {
            return Some(path);
        }
        self.raw.get(href).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Rewrite anchors in `html`, a page saved at `page`, returning the new
/// markup and how many anchors changed. Fragments are kept.
pub fn rewrite_anchors(
    html: &str,
    page: &SavedPage,
    targets: &LinkTargets,
) -> Result<(String, usize)> {
    let mut output = Vec::with_capacity(html.len());
    let rewritten = AtomicUsize::new(0);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href") {
                    let (target, fragment) = match href.split_once('#') {
                        Some((target, fragment)) => (target, Some(fragment)),
                        None => (href.as_str(), None),
                    };
                    if let Some(file) = targets.target(target, &page.uri) {
                        let mut local = relative_ref(&page.output_path, file);
                        if let Some(fragment) = fragment {
                            local.push('#');
                            local.push_str(fragment);
                        }
                        if local != href {
                            el.set_attribute("href", &local)?;
                            rewritten.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| anyhow!("HTML rewrite error: {e}"))?;
    rewriter
        .end()
        .map_err(|e| anyhow!("HTML rewrite finalization error: {e}"))?;

    let html = String::from_utf8(output).context("Invalid UTF-8 in rewritten HTML")?;
    Ok((html, rewritten.load(Ordering::Relaxed)))
}

/// Retarget anchors in every saved page. Returns the total number of
/// anchors changed. A page that cannot be read or written is skipped.
pub async fn retarget_links(store: &OutputStore, pages: &[SavedPage]) -> usize {
    let targets = LinkTargets::new(pages);
    if targets.is_empty() {
        return 0;
    }

    let mut total = 0;
    for page in pages {
        let path = store.absolute(&page.output_path);
        let html = match tokio::fs::read_to_string(&path).await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("Cannot read {} for link retargeting: {e}", path.display());
                continue;
            }
        };

        let (rewritten, count) = match rewrite_anchors(&html, page, &targets) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Link retargeting failed for {}: {e:#}", page.uri);
                continue;
            }
        };
        if count == 0 {
            continue;
        }

        match store.write(&page.output_path, rewritten.as_bytes()).await {
            Ok(_) => {
                log::debug!("Retargeted {count} link(s) in {}", page.output_path);
                total += count;
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    total
}
