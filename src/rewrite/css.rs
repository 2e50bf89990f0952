//! `url()` / `src()` reference rewriting for stylesheets.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use regex::{Captures, Regex};

use super::{persist_asset, persist_asset_nonblocking};
use crate::output::{AssetKind, relative_ref};
use crate::session::MirrorSession;
use crate::uri::{CanonicalUri, resolve};

static CSS_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(url|src)\s*\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"]*?))\s*\)"#)
        .expect("CSS reference pattern is valid")
});

/// Unique, localisable references in `css`, first occurrence first.
///
/// Empty references, `data:` URIs and fragment-only references are skipped.
pub fn css_references(css: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CSS_REFERENCE
        .captures_iter(css)
        .filter_map(|caps| {
            let raw = raw_reference(&caps).0.trim();
            let skip = raw.is_empty()
                || raw.starts_with('#')
                || raw.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"));
            (!skip && seen.insert(raw.to_string())).then(|| raw.to_string())
        })
        .collect()
}

/// Replace every `url()`/`src()` whose raw reference has a replacement,
/// keeping the function name and quote style of each occurrence.
pub fn substitute(css: &str, replacements: &HashMap<String, String>) -> String {
    if replacements.is_empty() {
        return css.to_string();
    }
    CSS_REFERENCE
        .replace_all(css, |caps: &Captures| {
            let (raw, quote) = raw_reference(caps);
            match replacements.get(raw.trim()) {
                Some(path) => format!("{}({quote}{path}{quote})", &caps[1]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn raw_reference<'h>(caps: &Captures<'h>) -> (&'h str, &'static str) {
    if let Some(m) = caps.get(2) {
        (m.as_str(), "\"")
    } else if let Some(m) = caps.get(3) {
        (m.as_str(), "'")
    } else {
        (caps.get(4).map_or("", |m| m.as_str()), "")
    }
}

/// Localise the references of a stylesheet that will be saved at `own_path`.
///
/// References resolve against `base`. A reference back to the stylesheet
/// itself becomes its own file name. References that cannot be fetched are
/// left as they were.
pub fn rewrite_css<'a>(
    session: &'a MirrorSession,
    css: &'a str,
    base: &'a CanonicalUri,
    own_path: &'a str,
) -> LocalBoxFuture<'a, String> {
    async move {
        let mut replacements = HashMap::new();

        for raw in css_references(css) {
            let target = match resolve(&raw, base) {
                Ok(resolved) => resolved.uri,
                Err(e) => {
                    log::debug!("Leaving CSS reference {raw:?} in {base}: {e}");
                    continue;
                }
            };

            let saved_at = if &target == base {
                Ok(own_path.to_string())
            } else {
                let kind = AssetKind::from_uri(&target);
                let entry = if kind == AssetKind::Styles {
                    persist_asset_nonblocking(session, &target, kind).await
                } else {
                    persist_asset(session, &target, kind).await
                };
                entry.map(|entry| entry.output_path)
            };

            match saved_at {
                Ok(path) => {
                    replacements.insert(raw, relative_ref(own_path, &path));
                }
                Err(e) => log::warn!("Asset unavailable {target} (from {base}): {e}"),
            }
        }

        substitute(css, &replacements)
    }
    .boxed_local()
}
