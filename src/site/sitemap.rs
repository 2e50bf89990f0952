//! `sitemap.xml` discovery.
//!
//! Both sitemap forms are understood: a `<urlset>` lists pages, a
//! `<sitemapindex>` lists further sitemaps that are expanded recursively up
//! to [`MAX_SITEMAP_DEPTH`] levels.

use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use thiserror::Error;

use crate::error::MirrorError;
use crate::resource::Resource;
use crate::session::MirrorSession;
use crate::uri::{CanonicalUri, resolve};
use crate::utils::constants::{MAX_SITEMAP_DEPTH, SITEMAP_PATH};

/// A parsed sitemap: `<loc>` values in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Child sitemaps
    Index(Vec<String>),
    /// Pages
    UrlSet(Vec<String>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SitemapError {
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    #[error("document has no root element")]
    Empty,
}

/// Namespace an element name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ElementNs {
    Unbound,
    Bound(Vec<u8>),
    /// Prefix used without a declaration
    Undeclared(Vec<u8>),
}

impl From<ResolveResult<'_>> for ElementNs {
    fn from(result: ResolveResult<'_>) -> Self {
        match result {
            ResolveResult::Unbound => Self::Unbound,
            ResolveResult::Bound(ns) => Self::Bound(ns.as_ref().to_vec()),
            ResolveResult::Unknown(prefix) => Self::Undeclared(prefix),
        }
    }
}

struct OpenElement {
    name: String,
    ns: ElementNs,
    /// A `<loc>` whose text is being collected
    collects: bool,
}

/// Parse a sitemap document.
///
/// Only `<loc>` children of the entries (`<url>` in a urlset, `<sitemap>` in
/// an index) count, and only in the root element's namespace. Extension
/// elements such as `<image:loc>` are ignored.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = NsReader::from_str(xml);
    // (is an index, root namespace)
    let mut root: Option<(bool, ElementNs)> = None;
    let mut open: Vec<OpenElement> = Vec::new();
    let mut locs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| SitemapError::Xml {
            position: reader.error_position(),
            message: e.to_string(),
        })?;

        match event {
            Event::Start(element) => {
                let (ns, local) = reader.resolve_element(element.name());
                let ns = ElementNs::from(ns);
                let name = String::from_utf8_lossy(local.as_ref()).to_ascii_lowercase();

                let collects = match &root {
                    None => false,
                    Some((is_index, root_ns)) => {
                        let entry = if *is_index { "sitemap" } else { "url" };
                        name == "loc"
                            && ns == *root_ns
                            && open.len() == 2
                            && open[1].name == entry
                            && open[1].ns == *root_ns
                    }
                };
                if root.is_none() {
                    match name.as_str() {
                        "sitemapindex" => root = Some((true, ns.clone())),
                        "urlset" => root = Some((false, ns.clone())),
                        _ => return Err(SitemapError::UnexpectedRoot(name)),
                    }
                }
                if collects {
                    current = Some(String::new());
                }
                open.push(OpenElement { name, ns, collects });
            }
            Event::End(_) => {
                if let Some(element) = open.pop()
                    && element.collects
                    && let Some(loc) = current.take()
                {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
            }
            Event::Text(text) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&text));
                }
            }
            Event::CData(data) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(loc) = current.as_mut() {
                    let name = String::from_utf8_lossy(&reference);
                    match resolve_entity(&name) {
                        Some(resolved) => loc.push_str(&resolved),
                        None => {
                            loc.push('&');
                            loc.push_str(&name);
                            loc.push(';');
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root {
        Some((true, _)) => Ok(SitemapDocument::Index(locs)),
        Some((false, _)) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(SitemapError::Empty),
    }
}

fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    quick_xml::escape::resolve_predefined_entity(name).map(Cow::Borrowed)
}

/// URL of the root sitemap of `site`.
pub fn sitemap_uri(site: &CanonicalUri) -> Result<CanonicalUri, MirrorError> {
    Ok(CanonicalUri::parse(&format!("{}{SITEMAP_PATH}", site.origin()))?)
}

/// Collect the page URLs of `site` from its sitemap.
///
/// Failure to load or parse the root sitemap is an error; a broken child
/// sitemap is skipped. Only pages on the same host as `site` are returned,
/// deduplicated, in discovery order.
pub async fn discover(
    session: &MirrorSession,
    site: &CanonicalUri,
) -> Result<Vec<CanonicalUri>, MirrorError> {
    let root = sitemap_uri(site)?;
    let mut queue = VecDeque::from([(root.clone(), 0usize)]);
    let mut visited = HashSet::new();
    let mut seen_pages = HashSet::new();
    let mut pages = Vec::new();

    while let Some((sitemap, depth)) = queue.pop_front() {
        if !visited.insert(sitemap.clone()) {
            continue;
        }

        let document = match load(session, &sitemap).await {
            Ok(document) => document,
            Err(e) if sitemap == root => return Err(e),
            Err(e) => {
                log::warn!("Skipping sitemap {sitemap}: {e}");
                continue;
            }
        };

        match document {
            SitemapDocument::Index(children) => {
                if depth + 1 >= MAX_SITEMAP_DEPTH {
                    log::warn!("Sitemap index {sitemap} nested too deeply, not expanded");
                    continue;
                }
                for loc in children {
                    match resolve(&loc, &sitemap) {
                        Ok(child) => queue.push_back((child.uri, depth + 1)),
                        Err(e) => log::debug!("Ignoring sitemap entry {loc:?}: {e}"),
                    }
                }
            }
            SitemapDocument::UrlSet(locs) => {
                for loc in locs {
                    match resolve(&loc, &sitemap) {
                        Ok(page) if page.uri.same_host(site) => {
                            if seen_pages.insert(page.uri.clone()) {
                                pages.push(page.uri);
                            }
                        }
                        Ok(page) => log::debug!("Ignoring off-site sitemap entry {}", page.uri),
                        Err(e) => log::debug!("Ignoring sitemap entry {loc:?}: {e}"),
                    }
                }
            }
        }
    }

    log::info!("Sitemap lists {} page(s) for {}", pages.len(), site.host());
    Ok(pages)
}

async fn load(
    session: &MirrorSession,
    sitemap: &CanonicalUri,
) -> Result<SitemapDocument, MirrorError> {
    let mut resource = Resource::new(sitemap.clone());
    resource.load(session.fetcher()).await?;
    let xml = resource.text().unwrap_or_default();
    parse_sitemap(&xml).map_err(|e| MirrorError::Parse {
        uri: sitemap.to_string(),
        message: e.to_string(),
    })
}
