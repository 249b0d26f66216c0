//! Remote specifier resolution.
//!
//! Decides which import specifiers this plugin handles and canonicalizes
//! them. Everything else falls through to the host's default resolution.
//!
//! ## Specifier Types
//!
//! - Absolute remote: `https://a.test/lib.mjs` — always handled.
//! - Relative with a remote importer: `./util.mjs`, `../x.mjs`, `/y.mjs`,
//!   `//cdn.test/z.mjs` — joined against the importer URL.
//! - Bare or local: `lodash`, `./local.ts` without a remote importer —
//!   declined.

use crate::canon::{is_remote_specifier, CanonError, ModuleUrl};

/// Resolver for http(s) module specifiers.
///
/// Stateless; every call is independent, so one instance can serve
/// concurrent resolution fan-out without synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpResolver;

impl HttpResolver {
    /// Create a new resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve a specifier against an optional remote importer.
    ///
    /// Returns `Ok(Some(url))` when this plugin handles the specifier,
    /// `Ok(None)` to fall through to default resolution, and an error only
    /// for specifiers that claim to be remote but cannot be canonicalized.
    pub fn resolve(
        &self,
        specifier: &str,
        importer: Option<&ModuleUrl>,
    ) -> Result<Option<ModuleUrl>, CanonError> {
        if is_remote_specifier(specifier) {
            return ModuleUrl::parse(specifier).map(Some);
        }

        if let Some(importer) = importer {
            if is_relative_specifier(specifier) {
                return importer.join(specifier).map(Some);
            }
        }

        // Bare or local specifier: not ours.
        Ok(None)
    }
}

/// Specifiers that resolve against a base URL rather than standing alone.
///
/// Protocol-relative (`//host/path`) and root-relative (`/path`) forms count:
/// inside a remote module they reference the importer's origin.
fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer(s: &str) -> ModuleUrl {
        ModuleUrl::parse(s).unwrap()
    }

    #[test]
    fn test_absolute_ignores_importer() {
        let resolver = HttpResolver::new();
        let spec = "https://Example.com/lib.mjs";

        let without = resolver.resolve(spec, None).unwrap().unwrap();
        let with = resolver
            .resolve(spec, Some(&importer("https://other.test/mod.mjs")))
            .unwrap()
            .unwrap();

        assert_eq!(without, with);
        assert_eq!(without.as_str(), "https://example.com/lib.mjs");
    }

    #[test]
    fn test_relative_against_remote_importer() {
        let resolver = HttpResolver::new();
        let base = importer("https://a.test/dir/mod.mjs");

        let resolved = resolver.resolve("./x.mjs", Some(&base)).unwrap().unwrap();
        assert_eq!(resolved.as_str(), "https://a.test/dir/x.mjs");

        let up = resolver.resolve("../up.mjs", Some(&base)).unwrap().unwrap();
        assert_eq!(up.as_str(), "https://a.test/up.mjs");

        let rooted = resolver.resolve("/root.mjs", Some(&base)).unwrap().unwrap();
        assert_eq!(rooted.as_str(), "https://a.test/root.mjs");
    }

    #[test]
    fn test_protocol_relative() {
        let resolver = HttpResolver::new();
        let base = importer("https://a.test/mod.mjs");

        let resolved = resolver
            .resolve("//cdn.test/lib.mjs", Some(&base))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.test/lib.mjs");
    }

    #[test]
    fn test_bare_specifier_declines() {
        let resolver = HttpResolver::new();
        let base = importer("https://a.test/mod.mjs");

        assert!(resolver.resolve("lodash", Some(&base)).unwrap().is_none());
        assert!(resolver.resolve("@scope/pkg", Some(&base)).unwrap().is_none());
    }

    #[test]
    fn test_relative_without_importer_declines() {
        let resolver = HttpResolver::new();
        assert!(resolver.resolve("./util.mjs", None).unwrap().is_none());
    }

    #[test]
    fn test_query_preserved() {
        let resolver = HttpResolver::new();
        let resolved = resolver
            .resolve("https://a.test/m.mjs?v=3", None)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.as_str(), "https://a.test/m.mjs?v=3");
    }
}
