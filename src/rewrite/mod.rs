//! Localisation of page sub-resources.
//!
//! The walk in [`walk`] finds scripts, stylesheets and images in a rendered
//! document, saves them under `client/` through the run's asset cache and
//! points the document at the local copies. Stylesheets have their own
//! `url()`/`src()` references localised the same way by [`css`] before they
//! are written. Inline code is collected into per-page [`bundle`]s.

pub mod bundle;
pub mod css;
pub mod dom;
pub mod walk;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::cache::{CacheEntry, Claim};
use crate::error::MirrorError;
use crate::output::AssetKind;
use crate::resource::Resource;
use crate::session::MirrorSession;
use crate::uri::CanonicalUri;

pub use bundle::{Bundles, finalize};
pub use css::rewrite_css;
pub use walk::{Discovered, WalkOutcome, walk};

/// Fetch, localise and save `uri` at most once per run.
///
/// Returns the entry of whichever task saved it first.
pub async fn persist_asset(
    session: &MirrorSession,
    uri: &CanonicalUri,
    kind: AssetKind,
) -> Result<CacheEntry, MirrorError> {
    let path = session.store().allocate_asset(uri, kind).await;
    session
        .assets()
        .fetch_once(uri, true, || load_and_save(session, uri, &path, kind))
        .await
}

/// Like [`persist_asset`] but never waits for a load already in progress.
///
/// An in-flight load still yields its allocated path: the owner writes the
/// file there. Used from inside stylesheets so that two stylesheets referencing
/// each other cannot wait on one another.
///
/// Stylesheets are localised one at a time, so an in-flight owner is always a
/// stylesheet further up the current import chain whose bytes are already
/// loaded. If writing that file fails, the path handed out here stays
/// dangling; the failure is logged by the owner.
pub async fn persist_asset_nonblocking(
    session: &MirrorSession,
    uri: &CanonicalUri,
    kind: AssetKind,
) -> Result<CacheEntry, MirrorError> {
    let path = session.store().allocate_asset(uri, kind).await;
    let claim = session
        .assets()
        .try_fetch_once(uri, true, || load_and_save(session, uri, &path, kind))
        .await?;
    Ok(match claim {
        Claim::Ready(entry) => entry,
        Claim::InFlight => CacheEntry::persisted(path),
    })
}

/// Fetch `uri` without saving it. The reference to it stays remote.
pub async fn probe_remote(
    session: &MirrorSession,
    uri: &CanonicalUri,
) -> Result<CacheEntry, MirrorError> {
    session
        .assets()
        .fetch_once(uri, false, || async {
            let mut resource = Resource::new(uri.clone());
            resource.load(session.fetcher()).await?;
            resource.release();
            Ok(CacheEntry::remote(uri))
        })
        .await
}

// Boxed because stylesheets recurse back into here through `rewrite_css`.
fn load_and_save<'a>(
    session: &'a MirrorSession,
    uri: &'a CanonicalUri,
    path: &'a str,
    kind: AssetKind,
) -> LocalBoxFuture<'a, Result<CacheEntry, MirrorError>> {
    async move {
        let mut resource = Resource::new(uri.clone());
        resource.load(session.fetcher()).await?;

        if kind == AssetKind::Styles {
            let source = resource.text().unwrap_or_default();
            let localised = rewrite_css(session, &source, uri, path).await;
            session.store().write(path, localised.as_bytes()).await?;
        } else {
            let bytes = resource.content().unwrap_or_default();
            session.store().write(path, bytes).await?;
        }

        resource.release();
        Ok(CacheEntry::persisted(path))
    }
    .boxed_local()
}
