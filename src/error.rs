//! Error taxonomy for a mirroring run.
//!
//! Per-asset and per-page errors are recoverable: they are logged and the
//! crawl moves on. Only configuration errors and a seed page that cannot be
//! mirrored end a run.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::uri::InvalidRef;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// Network or HTTP failure for an asset or sitemap
    #[error("fetch failed for {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: FetchError,
    },

    /// An earlier load of the same URI failed during this run
    #[error("{uri} unavailable, earlier attempt failed: {reason}")]
    Unavailable { uri: String, reason: String },

    /// The headless renderer could not produce a DOM for a page
    #[error("render failed for {uri}: {message}")]
    Render { uri: String, message: String },

    /// Malformed sitemap or unreadable document
    #[error("parse failed for {uri}: {message}")]
    Parse { uri: String, message: String },

    /// Filesystem write failure
    #[error("failed to save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidUri(#[from] InvalidRef),

    #[error("configuration error: {0}")]
    Config(String),
}

impl MirrorError {
    /// Whether the crawl can continue past this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl From<anyhow::Error> for MirrorError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain
        Self::Config(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `MirrorError`
pub type MirrorResult<T> = Result<T, MirrorError>;
