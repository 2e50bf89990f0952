//! A single HTML page: rendered, localised and saved.

use std::path::PathBuf;

use kuchiki::NodeRef;

use crate::cache::ResourceCache;
use crate::error::MirrorError;
use crate::render::with_page_timeout;
use crate::rewrite::{self, Discovered, dom};
use crate::session::MirrorSession;
use crate::uri::{CanonicalUri, classify_links, filter_unvisited};

/// A page of the mirrored site.
///
/// `render` fills in the document and reserves the output path; `save`
/// writes it. Both happen at most once per page.
#[derive(Debug)]
pub struct Page {
    uri: CanonicalUri,
    document: Option<NodeRef>,
    output_path: Option<String>,
    discovered: Discovered,
    rewritten: usize,
    failed: usize,
}

impl Page {
    pub fn new(uri: CanonicalUri) -> Self {
        Self {
            uri,
            document: None,
            output_path: None,
            discovered: Discovered::default(),
            rewritten: 0,
            failed: 0,
        }
    }

    pub fn uri(&self) -> &CanonicalUri {
        &self.uri
    }

    /// Render through the session's renderer and localise every asset.
    pub async fn render(&mut self, session: &MirrorSession) -> Result<(), MirrorError> {
        let config = session.config();
        let settle = config.settle_timeout_secs();
        let budget = config.navigation_timeout_secs() + settle;

        let label = format!("render {}", self.uri);
        let html = config
            .retry()
            .run(&label, || {
                with_page_timeout(session.renderer().render(&self.uri, settle), budget, "render")
            })
            .await
            .map_err(|exhausted| MirrorError::Render {
                uri: self.uri.to_string(),
                message: format!("{:#} (after {} attempt(s))", exhausted.error, exhausted.attempts),
            })?;

        let document = dom::parse(&html);
        let output_path = session.store().reserve_page(&self.uri).await;

        let outcome = rewrite::walk(session, &document, &self.uri, &output_path).await;
        let attached =
            rewrite::finalize(session, &document, &self.uri, &output_path, outcome.bundles).await;
        log::debug!(
            "{}: {} reference(s) localised, {} unavailable, {attached} bundle(s)",
            self.uri,
            outcome.rewritten,
            outcome.failed
        );

        self.discovered = outcome.discovered;
        self.rewritten = outcome.rewritten;
        self.failed = outcome.failed;
        self.document = Some(document);
        self.output_path = Some(output_path);
        Ok(())
    }

    /// Same-host anchors of the rendered page that are not in `pages` yet.
    pub fn links(&self, pages: &ResourceCache) -> Vec<CanonicalUri> {
        let Some(document) = self.document.as_ref() else {
            return Vec::new();
        };
        let hrefs = dom::anchor_hrefs(document);
        let links = classify_links(hrefs.iter().map(String::as_str), &self.uri);
        filter_unvisited(links, pages)
    }

    pub fn title(&self) -> Option<String> {
        self.document.as_ref().and_then(dom::title)
    }

    /// Output path relative to the mirror root, once rendered
    pub fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }

    pub fn discovered(&self) -> &Discovered {
        &self.discovered
    }

    /// References localised and references left remote because they failed
    pub fn asset_counts(&self) -> (usize, usize) {
        (self.rewritten, self.failed)
    }

    /// Serialise the document and write it at the reserved path.
    pub async fn save(&self, session: &MirrorSession) -> Result<PathBuf, MirrorError> {
        let (Some(document), Some(output_path)) = (self.document.as_ref(), self.output_path.as_deref())
        else {
            return Err(MirrorError::Render {
                uri: self.uri.to_string(),
                message: "page saved before it was rendered".to_string(),
            });
        };

        let html = dom::serialize(document).map_err(|e| MirrorError::Parse {
            uri: self.uri.to_string(),
            message: format!("{e:#}"),
        })?;
        let path = session.store().write(output_path, html.as_bytes()).await?;
        log::info!("Saved page {}", path.display());
        Ok(path)
    }
}
