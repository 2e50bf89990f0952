//! Page-link discovery: a pure classification stage followed by a cache filter.

use std::collections::HashSet;

use super::{CanonicalUri, resolve};
use crate::cache::ResourceCache;

/// Reduce raw anchor `href` values to the same-host pages they point at.
///
/// Fragments are stripped, fragment-only anchors and `javascript:`/`void(`
/// pseudo-links are skipped, cross-host and unresolvable references dropped.
/// Order of first appearance is kept and duplicates removed.
pub fn classify_links<'a, I>(hrefs: I, base: &CanonicalUri) -> Vec<CanonicalUri>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in hrefs {
        let href = href.trim();
        let without_fragment = href.split('#').next().unwrap_or_default().trim();
        if without_fragment.is_empty() || is_pseudo_link(without_fragment) {
            continue;
        }

        match resolve(without_fragment, base) {
            Ok(resolved) if !resolved.cross_host => {
                if seen.insert(resolved.uri.clone()) {
                    links.push(resolved.uri);
                }
            }
            Ok(_) => {}
            Err(e) => log::debug!("Skipping link `{href}`: {e}"),
        }
    }

    links
}

/// Drop links whose page has already been mirrored in this run.
pub fn filter_unvisited(links: Vec<CanonicalUri>, pages: &ResourceCache) -> Vec<CanonicalUri> {
    links
        .into_iter()
        .filter(|uri| !pages.contains(uri))
        .collect()
}

fn is_pseudo_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.contains("void(")
}
