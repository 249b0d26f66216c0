//! HTTP fetch layer.
//!
//! Thin wrapper over `reqwest` with the conservative defaults this plugin
//! commits to: bounded connect/total timeouts, a small redirect cap, and a
//! response size cap. Redirects are followed transparently and the final URL
//! reached is reported so the cache can alias the original id to it.

use crate::canon::{CanonError, ModuleUrl};
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Maximum redirects followed per fetch.
pub const MAX_REDIRECTS: usize = 5;

/// Maximum response body size (50 MiB).
pub const MAX_RESPONSE_SIZE: u64 = 50 * 1024 * 1024;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Total per-request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Failure fetching a remote module.
///
/// Cloneable on purpose: coalesced concurrent loads of one id all observe the
/// same failure, so the cause is carried as text rather than as the
/// non-clonable `reqwest::Error`.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("HTTP {status} fetching {url}")]
    Status { url: ModuleUrl, status: u16 },

    #[error("request timed out fetching {url}: {message}")]
    Timeout { url: ModuleUrl, message: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: ModuleUrl, message: String },

    #[error("network error fetching {url}: {message}")]
    Network { url: ModuleUrl, message: String },

    #[error("response too large for {url}: {size} bytes (max {max})")]
    TooLarge { url: ModuleUrl, size: u64, max: u64 },

    #[error("redirect target of {url} is not fetchable: {source}")]
    RedirectTarget {
        url: ModuleUrl,
        #[source]
        source: CanonError,
    },
}

impl LoadError {
    /// The module id the failing fetch was issued for.
    #[must_use]
    pub fn url(&self) -> &ModuleUrl {
        match self {
            Self::Status { url, .. }
            | Self::Timeout { url, .. }
            | Self::Connect { url, .. }
            | Self::Network { url, .. }
            | Self::TooLarge { url, .. }
            | Self::RedirectTarget { url, .. } => url,
        }
    }

    fn from_reqwest(url: &ModuleUrl, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.clone(),
                message: e.to_string(),
            }
        } else if e.is_connect() {
            Self::Connect {
                url: url.clone(),
                message: e.to_string(),
            }
        } else {
            Self::Network {
                url: url.clone(),
                message: e.to_string(),
            }
        }
    }
}

/// Raw result of one fetch, before caching.
#[derive(Debug)]
pub struct FetchedResponse {
    /// Canonical URL actually reached after redirects.
    pub final_url: ModuleUrl,
    /// Declared content-type header, if any.
    pub content_type: Option<String>,
    /// Response body.
    pub bytes: Bytes,
}

/// HTTP client for module fetches.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
}

impl HttpClient {
    /// Create a client with the default timeouts and redirect policy.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self, crate::Error> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("httpfile/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::Error::client(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client (tests inject one here).
    #[must_use]
    pub fn from_client(http: Client) -> Self {
        Self { http }
    }

    /// Issue one GET for a module, following redirects.
    ///
    /// # Errors
    /// Non-2xx status, timeout, connection or transfer failure, an
    /// over-sized body, or a redirect landing outside http(s).
    pub async fn fetch(&self, url: &ModuleUrl) -> Result<FetchedResponse, LoadError> {
        tracing::debug!(url = %url, "fetching remote module");

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| LoadError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        // reqwest has already followed redirects; this is where we ended up.
        let final_url = ModuleUrl::from_url(response.url().clone(), url.as_str())
            .map_err(|e| LoadError::RedirectTarget {
                url: url.clone(),
                source: e,
            })?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(LoadError::TooLarge {
                    url: url.clone(),
                    size: len,
                    max: MAX_RESPONSE_SIZE,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::from_reqwest(url, &e))?;

        if bytes.len() as u64 > MAX_RESPONSE_SIZE {
            return Err(LoadError::TooLarge {
                url: url.clone(),
                size: bytes.len() as u64,
                max: MAX_RESPONSE_SIZE,
            });
        }

        tracing::debug!(
            url = %final_url,
            bytes = bytes.len(),
            "fetched remote module"
        );

        Ok(FetchedResponse {
            final_url,
            content_type,
            bytes,
        })
    }
}
