//! Bottom-up localisation walk over a rendered document.
//!
//! The element list is captured in post-order before anything is changed.
//! Inline `<script>`/`<style>` nodes are lifted into [`Bundles`] and detached.
//! Every remote reference becomes a task; tasks run one tree level at a
//! time from the deepest level up, with bounded concurrency inside a level,
//! and their attribute rewrites are applied once the level has finished.
//! Stylesheets within a level are the exception: they are localised one at a
//! time, so the names of the assets they reference never depend on download
//! timing.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use kuchiki::NodeRef;
use kuchiki::iter::NodeEdge;

use super::bundle::Bundles;
use super::{dom, persist_asset, probe_remote};
use crate::error::MirrorError;
use crate::output::{AssetKind, relative_ref};
use crate::session::MirrorSession;
use crate::uri::{CanonicalUri, resolve};

/// Remote resources referenced by a page, grouped by role.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub preload_scripts: Vec<CanonicalUri>,
    pub scripts: Vec<CanonicalUri>,
    pub styles: Vec<CanonicalUri>,
    pub images: Vec<CanonicalUri>,
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub bundles: Bundles,
    pub discovered: Discovered,
    /// References now pointing at a local file
    pub rewritten: usize,
    /// References left as they were because the asset was unavailable
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Save locally and point the attribute at the copy
    Persist(AssetKind),
    /// Fetch through the cache but keep the remote reference
    Probe,
}

struct Task {
    node: NodeRef,
    attr: &'static str,
    uri: CanonicalUri,
    action: Action,
}

/// Localise the sub-resources of `document`, a page that will be saved at
/// `page_path` and was loaded from `base`.
pub async fn walk(
    session: &MirrorSession,
    document: &NodeRef,
    base: &CanonicalUri,
    page_path: &str,
) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut levels: BTreeMap<usize, Vec<Task>> = BTreeMap::new();
    let mut lifted = Vec::new();

    for node in post_order_elements(document) {
        let Some(tag) = dom::tag_name(&node) else {
            continue;
        };
        let in_head = dom::parent_tag(&node).as_deref() == Some("head");

        let task = match tag.as_str() {
            "script" => match dom::attr(&node, "src") {
                Some(src) => reference(&src, base).map(|(uri, cross_host)| {
                    if in_head {
                        outcome.discovered.preload_scripts.push(uri.clone());
                    } else {
                        outcome.discovered.scripts.push(uri.clone());
                    }
                    let action = if cross_host {
                        Action::Probe
                    } else {
                        Action::Persist(AssetKind::Scripts)
                    };
                    Task { node: node.clone(), attr: "src", uri, action }
                }),
                None => {
                    if is_classic_script(&node) {
                        let code = node.text_contents();
                        if in_head {
                            outcome.bundles.push_preload_script(&code);
                        } else {
                            outcome.bundles.push_script(&code);
                        }
                        lifted.push(node.clone());
                    }
                    None
                }
            },
            "link" if is_stylesheet_link(&node) => dom::attr(&node, "href")
                .and_then(|href| reference(&href, base))
                .filter(|(_, cross_host)| !cross_host)
                .map(|(uri, _)| {
                    outcome.discovered.styles.push(uri.clone());
                    Task {
                        node: node.clone(),
                        attr: "href",
                        uri,
                        action: Action::Persist(AssetKind::Styles),
                    }
                }),
            "style" => {
                outcome.bundles.push_style(&node.text_contents());
                lifted.push(node.clone());
                None
            }
            "img" => dom::attr(&node, "src")
                .and_then(|src| reference(&src, base))
                .map(|(uri, _)| {
                    outcome.discovered.images.push(uri.clone());
                    let kind = AssetKind::from_uri(&uri);
                    Task { node: node.clone(), attr: "src", uri, action: Action::Persist(kind) }
                }),
            _ => None,
        };

        if let Some(task) = task {
            levels.entry(node.ancestors().count()).or_default().push(task);
        }
    }

    for node in lifted {
        node.detach();
    }

    let concurrency = session.config().max_concurrent_assets().max(1);
    for (depth, tasks) in levels.into_iter().rev() {
        log::debug!("Resolving {} asset(s) at depth {depth} of {base}", tasks.len());

        // Allocate in document order so collision suffixes do not depend on
        // which download finishes first.
        for task in &tasks {
            if let Action::Persist(kind) = task.action {
                session.store().allocate_asset(&task.uri, kind).await;
            }
        }

        // Stylesheets name their nested assets while they are rewritten, so
        // they run one after another in document order. Everything else in
        // the level is already allocated and downloads alongside them.
        let (stylesheets, others): (Vec<Task>, Vec<Task>) = tasks
            .into_iter()
            .partition(|task| task.action == Action::Persist(AssetKind::Styles));

        let concurrent = stream::iter(others)
            .map(|task| async move {
                let result = run_task(session, &task).await;
                (task, result)
            })
            .buffered(concurrency)
            .collect::<Vec<_>>();
        let in_order = stream::iter(stylesheets)
            .then(|task| async move {
                let result = run_task(session, &task).await;
                (task, result)
            })
            .collect::<Vec<_>>();

        let (mut results, styled): (Vec<(Task, Result<Option<String>, MirrorError>)>, Vec<_>) =
            futures::join!(concurrent, in_order);
        results.extend(styled);

        for (task, result) in results {
            match result {
                Ok(Some(path)) => {
                    dom::set_attr(&task.node, task.attr, &relative_ref(page_path, &path));
                    outcome.rewritten += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Asset unavailable {} (from {base}): {e}", task.uri);
                    outcome.failed += 1;
                }
            }
        }
    }

    outcome
}

async fn run_task(session: &MirrorSession, task: &Task) -> Result<Option<String>, MirrorError> {
    match task.action {
        Action::Persist(kind) => persist_asset(session, &task.uri, kind)
            .await
            .map(|entry| Some(entry.output_path)),
        Action::Probe => probe_remote(session, &task.uri).await.map(|_| None),
    }
}

/// Elements in post-order: children before their parent.
fn post_order_elements(document: &NodeRef) -> Vec<NodeRef> {
    document
        .traverse()
        .filter_map(|edge| match edge {
            NodeEdge::End(node) if node.as_element().is_some() => Some(node),
            _ => None,
        })
        .collect()
}

/// Resolve an attribute value. `data:` and unresolvable references yield `None`.
fn reference(raw: &str, base: &CanonicalUri) -> Option<(CanonicalUri, bool)> {
    let raw = raw.trim();
    if raw.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return None;
    }
    match resolve(raw, base) {
        Ok(resolved) => Some((resolved.uri, resolved.cross_host)),
        Err(e) => {
            log::debug!("Leaving reference {raw:?} in {base}: {e}");
            None
        }
    }
}

fn is_stylesheet_link(node: &NodeRef) -> bool {
    dom::attr(node, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

/// Inline scripts that can be concatenated into a classic script file.
/// JSON data blocks, templates and modules stay in the page.
fn is_classic_script(node: &NodeRef) -> bool {
    match dom::attr(node, "type") {
        None => true,
        Some(kind) => matches!(
            kind.trim().to_ascii_lowercase().as_str(),
            "" | "text/javascript" | "application/javascript" | "text/ecmascript"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_order_visits_children_first() {
        let document = dom::parse("<html><head></head><body><div><img src=a.png></div></body></html>");
        let tags: Vec<_> = post_order_elements(&document)
            .iter()
            .filter_map(dom::tag_name)
            .collect();
        assert_eq!(tags, vec!["head", "img", "div", "body", "html"]);
    }

    #[test]
    fn only_classic_scripts_are_bundled() {
        let document = dom::parse(
            r#"<script>a()</script><script type="module">b()</script>
               <script type="application/ld+json">{}</script><script type="text/javascript">c()</script>"#,
        );
        let flags: Vec<_> = document
            .select("script")
            .unwrap()
            .map(|s| is_classic_script(s.as_node()))
            .collect();
        assert_eq!(flags, vec![true, false, false, true]);
    }

    #[test]
    fn stylesheet_rel_is_matched_by_token() {
        let document = dom::parse(
            r#"<link rel="Alternate StyleSheet" href=a.css><link rel="preload" href=b.css>"#,
        );
        let flags: Vec<_> = document
            .select("link")
            .unwrap()
            .map(|l| is_stylesheet_link(l.as_node()))
            .collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn data_uris_are_not_references() {
        let base = CanonicalUri::parse("https://site.test/page").unwrap();
        assert!(reference("DATA:image/png;base64,AA", &base).is_none());
        assert_eq!(
            reference(" /img/a.png ", &base),
            Some((CanonicalUri::parse("https://site.test/img/a.png").unwrap(), false))
        );
        assert!(reference("https://cdn.test/a.js", &base).unwrap().1);
    }
}
