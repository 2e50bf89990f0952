//! Whole-site orchestration: sitemap discovery, per-page mirroring and the
//! final pass that points links between saved pages at local files.

pub mod crawler;
pub mod retarget;
pub mod sitemap;

pub use crawler::{CrawlState, MirrorReport, SiteCrawler};
pub use retarget::{LinkTargets, SavedPage, retarget_links, rewrite_anchors};
pub use sitemap::{SitemapDocument, SitemapError, discover, parse_sitemap};
