//! Raw byte fetching for assets and sitemaps.
//!
//! The [`Fetcher`] trait is the seam between the mirroring pipeline and the
//! network. [`HttpFetcher`] is the reqwest implementation used by the binary;
//! tests plug in in-memory fetchers.

pub mod http;
pub mod retry;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::uri::CanonicalUri;

pub use http::HttpFetcher;
pub use retry::{Exhausted, RetryPolicy, Transient};

/// Boxed future returned by [`Fetcher::fetch`]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;

/// Fetch the body of a canonical URI.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, uri: &'a CanonicalUri) -> FetchFuture<'a>;
}

/// Error type for download failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP error {status}")]
    Status { status: u16 },

    #[error("body too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: usize },

    #[error("{last} (gave up after {attempts} attempts)")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl Transient for FetchError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status { status } => *status == 429 || *status >= 500,
            Self::TooLarge { .. } | Self::Exhausted { .. } => false,
        }
    }
}

impl From<Exhausted<FetchError>> for FetchError {
    fn from(exhausted: Exhausted<FetchError>) -> Self {
        if exhausted.attempts <= 1 {
            exhausted.error
        } else {
            Self::Exhausted {
                attempts: exhausted.attempts,
                last: Box::new(exhausted.error),
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}
