//! Resolution of raw `href`/`src`/`url()` references against a base URI.

use thiserror::Error;
use url::Url;

use super::CanonicalUri;

/// A reference that cannot be mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRef {
    #[error("empty reference")]
    Empty,

    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("unparseable reference `{reference}`: {reason}")]
    Malformed { reference: String, reason: String },

    #[error("reference `{0}` has no host")]
    MissingHost(String),
}

/// A reference resolved to its canonical absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub uri: CanonicalUri,
    /// Host differs from the base host
    pub cross_host: bool,
}

/// Resolve `raw` against `base`.
///
/// Rules, in priority order:
/// 1. empty or whitespace-only is invalid
/// 2. protocol-relative (`//host/..`) and absolute `http(s)://` references are parsed as-is
/// 3. root-relative references (`/..` or `\..`) are joined onto the base origin
/// 4. anything else resolves relative to the base directory
///
/// Results whose scheme is not http(s) (`mailto:`, `data:`, `javascript:`, ...) are invalid.
pub fn resolve(raw: &str, base: &CanonicalUri) -> Result<Resolved, InvalidRef> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidRef::Empty);
    }

    let malformed = |e: url::ParseError| InvalidRef::Malformed {
        reference: trimmed.to_string(),
        reason: e.to_string(),
    };

    if let Some(rest) = trimmed.strip_prefix("//") {
        let url = Url::parse(&format!("{}://{rest}", base.scheme())).map_err(malformed)?;
        return finish(url, base);
    }

    if has_http_scheme(trimmed) {
        let url = Url::parse(trimmed).map_err(malformed)?;
        return finish(url, base);
    }

    if trimmed.starts_with('/') || trimmed.starts_with('\\') {
        let path = trimmed.replace('\\', "/");
        // A doubled separator after normalisation must not turn into a host.
        let path = format!("/{}", path.trim_start_matches('/'));
        let url = Url::parse(&format!("{}{path}", base.origin())).map_err(malformed)?;
        let uri = CanonicalUri::from_url(url)?;
        return Ok(Resolved {
            uri,
            cross_host: false,
        });
    }

    // Anything carrying its own scheme (`mailto:`, `data:`, ...) parses standalone.
    if let Ok(url) = Url::parse(trimmed) {
        return Err(InvalidRef::UnsupportedScheme(url.scheme().to_string()));
    }

    let url = base.as_url().join(trimmed).map_err(malformed)?;
    finish(url, base)
}

fn finish(url: Url, base: &CanonicalUri) -> Result<Resolved, InvalidRef> {
    let uri = CanonicalUri::from_url(url)?;
    let cross_host = !uri.same_host(base);
    Ok(Resolved { uri, cross_host })
}

fn has_http_scheme(reference: &str) -> bool {
    let lower = reference
        .get(..8)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| reference.to_ascii_lowercase());
    lower.starts_with("http://") || lower.starts_with("https://")
}
