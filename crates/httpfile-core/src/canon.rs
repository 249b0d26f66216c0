//! Canonical module identity.
//!
//! Wraps `url::Url` so that every remote module has exactly one identity:
//! lowercase scheme/host, default ports stripped, `.`/`..` segments resolved,
//! fragment dropped, query preserved. Two specifiers that denote the same
//! resource always canonicalize to the same `ModuleUrl`.

use std::fmt;
use url::Url;

/// Canonical identifier for a remote module.
///
/// Only `http` and `https` URLs can be constructed; the fragment is always
/// stripped because it never changes the fetched resource. The query string
/// stays part of the identity (different queries are different modules).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleUrl(Url);

/// Error canonicalizing a specifier into a [`ModuleUrl`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum CanonError {
    #[error("invalid URL '{specifier}': {message}")]
    Parse { specifier: String, message: String },

    #[error("unsupported scheme '{scheme}' in '{specifier}'")]
    Scheme { specifier: String, scheme: String },
}

impl ModuleUrl {
    /// Parse and canonicalize an absolute http(s) URL.
    pub fn parse(specifier: &str) -> Result<Self, CanonError> {
        let url = Url::parse(specifier).map_err(|e| CanonError::Parse {
            specifier: specifier.to_string(),
            message: e.to_string(),
        })?;
        Self::from_url(url, specifier)
    }

    /// Canonicalize an already-parsed URL.
    pub fn from_url(mut url: Url, specifier: &str) -> Result<Self, CanonError> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CanonError::Scheme {
                    specifier: specifier.to_string(),
                    scheme: other.to_string(),
                })
            }
        }
        url.set_fragment(None);
        Ok(Self(url))
    }

    /// Resolve a relative specifier against this URL per standard
    /// URL-resolution rules (RFC 3986 reference resolution).
    pub fn join(&self, specifier: &str) -> Result<Self, CanonError> {
        let joined = self.0.join(specifier).map_err(|e| CanonError::Parse {
            specifier: specifier.to_string(),
            message: e.to_string(),
        })?;
        Self::from_url(joined, specifier)
    }

    /// The canonical string form, used as the bundler-facing module id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Extension of the final path segment, if any (e.g. `mjs` for
    /// `https://a.test/lib/mod.mjs?v=2`).
    #[must_use]
    pub fn path_extension(&self) -> Option<&str> {
        let segment = self.0.path_segments()?.last()?;
        let (stem, ext) = segment.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext)
    }

    /// Access the underlying URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ModuleUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Check whether a raw specifier is an absolute http(s) URL.
#[must_use]
pub fn is_remote_specifier(specifier: &str) -> bool {
    let lower = specifier.get(..8).unwrap_or(specifier).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
