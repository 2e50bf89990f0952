//! reqwest-backed [`Fetcher`] with streaming size limits and bounded retry.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Client;

use super::{FetchError, FetchFuture, Fetcher, RetryPolicy};
use crate::config::MirrorConfig;
use crate::uri::CanonicalUri;
use crate::utils::constants::{
    CHROME_USER_AGENT, DEFAULT_LANG, DEFAULT_MAX_ASSET_SIZE_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Configuration for request timeouts, size limits and identity headers
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    pub user_agent: String,
    /// Sent as `Accept-Language`
    pub lang: String,
    /// `host:port` of an HTTP proxy
    pub proxy: Option<String>,
    pub request_timeout: Duration,
    /// Maximum body size (bytes); larger bodies are rejected while streaming
    pub max_body_bytes: usize,
    pub retry: RetryPolicy,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            user_agent: CHROME_USER_AGENT.to_string(),
            lang: DEFAULT_LANG.to_string(),
            proxy: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_ASSET_SIZE_BYTES,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&MirrorConfig> for HttpFetcherOptions {
    fn from(config: &MirrorConfig) -> Self {
        Self {
            user_agent: config.user_agent().to_string(),
            lang: config.lang().to_string(),
            proxy: config.proxy().map(str::to_string),
            request_timeout: Duration::from_secs(config.request_timeout_secs()),
            max_body_bytes: config.max_asset_size_bytes(),
            retry: config.retry().clone(),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    options: HttpFetcherOptions,
}

impl HttpFetcher {
    pub fn new(options: HttpFetcherOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.request_timeout)
            // Mirrors the renderer, which runs with --ignore-certificate-errors
            .danger_accept_invalid_certs(true);

        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(format!("http://{proxy}"))
                .with_context(|| format!("Invalid proxy address: {proxy}"))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client, options })
    }

    pub fn from_config(config: &MirrorConfig) -> Result<Self> {
        Self::new(HttpFetcherOptions::from(config))
    }

    /// Single download attempt with status check and streamed size limit.
    async fn download(&self, uri: &CanonicalUri) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(uri.as_str())
            .header("Accept", "*/*")
            .header("Accept-Language", self.options.lang.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let limit = self.options.max_body_bytes;

        // Enforce limit BEFORE downloading
        let expected_size = response.content_length().unwrap_or(0);
        if expected_size > limit as u64 {
            return Err(FetchError::TooLarge {
                size: expected_size,
                limit,
            });
        }

        let mut buffer = Vec::with_capacity(expected_size as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let new_total = buffer.len() + chunk.len();
            if new_total > limit {
                return Err(FetchError::TooLarge {
                    size: new_total as u64,
                    limit,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(buffer)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, uri: &'a CanonicalUri) -> FetchFuture<'a> {
        Box::pin(async move {
            let label = format!("GET {uri}");
            let body = self
                .options
                .retry
                .run(&label, || self.download(uri))
                .await?;
            log::debug!("Fetched {uri} ({} bytes)", body.len());
            Ok(body)
        })
    }
}
