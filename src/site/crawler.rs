use serde::{Deserialize, Serialize};

use super::retarget::{SavedPage, retarget_links};
use super::sitemap;
use crate::cache::CacheEntry;
use crate::config::MirrorMode;
use crate::error::MirrorError;
use crate::page::Page;
use crate::session::MirrorSession;
use crate::uri::CanonicalUri;

/// Phase of a crawl. Advances strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrawlState {
    Idle,
    Discovery,
    FetchRewriteSave,
    LinkRetarget,
    Done,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorReport {
    pub pages_saved: usize,
    pub pages_failed: usize,
    /// Distinct assets written under `client/`
    pub assets_persisted: usize,
    /// Anchors pointed at a local page file
    pub links_retargeted: usize,
}

/// Drives one run: discover pages, mirror each, then retarget links.
pub struct SiteCrawler<'s> {
    session: &'s MirrorSession,
    state: CrawlState,
    saved: Vec<SavedPage>,
    report: MirrorReport,
}

impl<'s> SiteCrawler<'s> {
    pub fn new(session: &'s MirrorSession) -> Self {
        Self {
            session,
            state: CrawlState::Idle,
            saved: Vec::new(),
            report: MirrorReport::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Run to completion.
    ///
    /// Fails only when the start page itself cannot be mirrored; every other
    /// page failure is counted in the report.
    pub async fn run(mut self) -> Result<MirrorReport, MirrorError> {
        let seed = self.session.config().start_url().clone();

        self.advance(CrawlState::Discovery);
        match self.session.config().mode() {
            MirrorMode::SinglePage => {
                self.advance(CrawlState::FetchRewriteSave);
                self.mirror(Page::new(seed)).await?;
            }
            MirrorMode::FullSite => {
                let links = self.discover(&seed).await?;

                self.advance(CrawlState::FetchRewriteSave);
                let total = links.len();
                for (i, uri) in links.into_iter().enumerate() {
                    if self.session.pages().contains(&uri) {
                        continue;
                    }
                    let is_seed = uri == seed;
                    match self.mirror(Page::new(uri.clone())).await {
                        Ok(page) => log::info!(
                            "Added page \"{}\" ({} of {total})",
                            page.title().unwrap_or_else(|| uri.to_string()),
                            i + 1
                        ),
                        Err(e) if is_seed => return Err(e),
                        Err(e) => {
                            log::warn!("Skipping page {uri}: {e}");
                            self.report.pages_failed += 1;
                        }
                    }
                }

                self.advance(CrawlState::LinkRetarget);
                self.report.links_retargeted =
                    retarget_links(self.session.store(), &self.saved).await;
            }
        }

        self.advance(CrawlState::Done);
        self.report.assets_persisted = self.session.assets().persisted_count();
        log::info!(
            "Mirrored {} page(s) into {} ({} failed, {} asset(s), {} link(s) retargeted)",
            self.report.pages_saved,
            self.session.store().root().display(),
            self.report.pages_failed,
            self.report.assets_persisted,
            self.report.links_retargeted
        );
        Ok(self.report)
    }

    /// Page list for a full-site run, start page first.
    ///
    /// Without a usable sitemap the start page is mirrored right away and
    /// its own links become the list.
    async fn discover(&mut self, seed: &CanonicalUri) -> Result<Vec<CanonicalUri>, MirrorError> {
        match sitemap::discover(self.session, seed).await {
            Ok(mut links) if !links.is_empty() => {
                links.retain(|link| link != seed);
                links.insert(0, seed.clone());
                Ok(links)
            }
            outcome => {
                match outcome {
                    Ok(_) => log::warn!("Sitemap of {} lists no pages, crawling from the start page", seed.host()),
                    Err(e) => log::warn!("No usable sitemap ({e}), crawling from the start page"),
                }
                let page = self.mirror(Page::new(seed.clone())).await?;
                log::info!(
                    "Added page \"{}\" (start page)",
                    page.title().unwrap_or_else(|| seed.to_string())
                );
                Ok(page.links(self.session.pages()))
            }
        }
    }

    async fn mirror(&mut self, mut page: Page) -> Result<Page, MirrorError> {
        page.render(self.session).await?;
        page.save(self.session).await?;

        if let Some(output_path) = page.output_path() {
            self.session
                .pages()
                .record(page.uri(), CacheEntry::persisted(output_path));
            self.saved.push(SavedPage {
                uri: page.uri().clone(),
                output_path: output_path.to_string(),
            });
        }
        self.report.pages_saved += 1;
        Ok(page)
    }

    fn advance(&mut self, next: CrawlState) {
        debug_assert!(next > self.state, "crawl state must advance");
        log::debug!("Crawl state {:?} -> {next:?}", self.state);
        self.state = next;
    }
}
