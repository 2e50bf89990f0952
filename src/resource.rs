//! A single remote resource and its in-memory bytes.

use crate::error::MirrorError;
use crate::fetch::Fetcher;
use crate::uri::CanonicalUri;

/// Remote bytes addressed by a canonical URI.
///
/// Content lives only between a successful load and the save that follows;
/// call [`Resource::release`] once the bytes are on disk. Stylesheets keep their
/// bytes long enough to have their `url()` references rewritten.
#[derive(Debug, Default)]
pub struct Resource {
    uri: Option<CanonicalUri>,
    content: Option<Vec<u8>>,
    loaded: bool,
}

impl Resource {
    pub fn new(uri: CanonicalUri) -> Self {
        Self {
            uri: Some(uri),
            content: None,
            loaded: false,
        }
    }

    pub fn uri(&self) -> Option<&CanonicalUri> {
        self.uri.as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Option<String> {
        self.content
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Fetch the bytes. A second call on a loaded resource is a no-op.
    pub async fn load(&mut self, fetcher: &dyn Fetcher) -> Result<(), MirrorError> {
        if self.loaded {
            return Ok(());
        }
        let Some(uri) = self.uri.as_ref() else {
            return Err(MirrorError::Config("resource has no URI".to_string()));
        };

        let bytes = fetcher
            .fetch(uri)
            .await
            .map_err(|source| MirrorError::Fetch {
                uri: uri.to_string(),
                source,
            })?;

        self.content = Some(bytes);
        self.loaded = true;
        Ok(())
    }

    /// Drop the in-memory bytes, keeping the loaded flag.
    pub fn release(&mut self) {
        self.content = None;
    }
}
