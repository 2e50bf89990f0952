//! Per-page bundles of inline code.

use kuchiki::NodeRef;

use super::css::rewrite_css;
use super::dom;
use crate::output::{BundlePaths, relative_ref};
use crate::session::MirrorSession;
use crate::uri::CanonicalUri;

/// Inline code lifted out of a page, in document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bundles {
    /// Inline `<script>`s that sat in `<head>`
    pub preload_script: String,
    /// Inline `<script>`s from anywhere else
    pub script: String,
    /// Inline `<style>` blocks
    pub style: String,
}

impl Bundles {
    pub fn push_preload_script(&mut self, code: &str) {
        append(&mut self.preload_script, code);
    }

    pub fn push_script(&mut self, code: &str) {
        append(&mut self.script, code);
    }

    pub fn push_style(&mut self, css: &str) {
        append(&mut self.style, css);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preload_script.is_empty() && self.script.is_empty() && self.style.is_empty()
    }
}

fn append(bundle: &mut String, code: &str) {
    if code.trim().is_empty() {
        return;
    }
    if !bundle.is_empty() {
        bundle.push_str("\n\n");
    }
    bundle.push_str(code);
}

/// Save the bundles of the page stored at `page_path` and link them from
/// `document`. Returns how many bundles were attached.
///
/// An element is added only after its file was written.
pub async fn finalize(
    session: &MirrorSession,
    document: &NodeRef,
    page_uri: &CanonicalUri,
    page_path: &str,
    bundles: Bundles,
) -> usize {
    let paths = BundlePaths::for_page(page_path);
    let head = dom::first(document, "head");
    let body = dom::first(document, "body");
    let mut attached = 0;

    if !bundles.style.is_empty() {
        let css = rewrite_css(session, &bundles.style, page_uri, &paths.style).await;
        if save(session, &paths.style, &css).await
            && let (Some(head), Some(link)) = (
                head.as_ref(),
                dom::stylesheet_link(&relative_ref(page_path, &paths.style)),
            )
        {
            head.append(link);
            attached += 1;
        }
    }

    if !bundles.preload_script.is_empty()
        && save(session, &paths.preload_script, &bundles.preload_script).await
        && let (Some(head), Some(script)) = (
            head.as_ref(),
            dom::script_tag(&relative_ref(page_path, &paths.preload_script)),
        )
    {
        head.append(script);
        attached += 1;
    }

    if !bundles.script.is_empty()
        && save(session, &paths.script, &bundles.script).await
        && let (Some(body), Some(script)) = (
            body.as_ref(),
            dom::script_tag(&relative_ref(page_path, &paths.script)),
        )
    {
        body.append(script);
        attached += 1;
    }

    attached
}

async fn save(session: &MirrorSession, path: &str, contents: &str) -> bool {
    match session.store().write(path, contents.as_bytes()).await {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Failed to save bundle {path}: {e}");
            false
        }
    }
}
