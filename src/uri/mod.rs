//! Canonical URIs and reference resolution.
//!
//! Every fetched resource and every visited page is keyed by a [`CanonicalUri`]:
//! an absolute http(s) URL with the fragment removed. Two hrefs that resolve to the
//! same canonical form share one cache entry and one output file.

pub mod links;
pub mod resolve;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

pub use links::{classify_links, filter_unvisited};
pub use resolve::{InvalidRef, Resolved, resolve};

/// An immutable, cheaply-cloneable absolute http(s) URI without fragment.
///
/// The parsed `Url` is shared via `Arc`, so clones used as cache keys and
/// handed between concurrent asset tasks never re-parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUri {
    url: Arc<Url>,
}

impl CanonicalUri {
    pub fn parse(input: &str) -> Result<Self, InvalidRef> {
        let url = Url::parse(input.trim()).map_err(|e| InvalidRef::Malformed {
            reference: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url)
    }

    /// Canonicalize an already parsed URL.
    ///
    /// Rejects non-http(s) schemes and URLs without a host, and drops the fragment.
    pub fn from_url(mut url: Url) -> Result<Self, InvalidRef> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidRef::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(InvalidRef::MissingHost(url.to_string()));
        }
        url.set_fragment(None);
        Ok(Self { url: Arc::new(url) })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Lower-cased host name. Always present for a canonical URI.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Same-host check used for every crawl and asset decision.
    ///
    /// Scheme and port are ignored: `http://site/a` and `https://site/b` are the same site.
    pub fn same_host(&self, other: &CanonicalUri) -> bool {
        self.host().eq_ignore_ascii_case(other.host())
    }

    /// `scheme://host[:port]` with no trailing slash.
    pub fn origin(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}://{}:{port}", self.url.scheme(), self.host()),
            None => format!("{}://{}", self.url.scheme(), self.host()),
        }
    }

    /// Path plus query, the form a root-relative href takes.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// Last non-empty path segment, if any.
    pub fn last_segment(&self) -> Option<&str> {
        self.url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl Hash for CanonicalUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.as_str().hash(state);
    }
}

impl FromStr for CanonicalUri {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CanonicalUri {
    type Error = InvalidRef;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for CanonicalUri {
    type Error = InvalidRef;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<CanonicalUri> for String {
    fn from(uri: CanonicalUri) -> Self {
        uri.url.as_str().to_string()
    }
}

impl AsRef<str> for CanonicalUri {
    fn as_ref(&self) -> &str {
        self.url.as_str()
    }
}

impl Deref for CanonicalUri {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.url
    }
}
