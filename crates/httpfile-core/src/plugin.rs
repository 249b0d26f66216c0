//! Plugin interface between the host bundler and module providers.
//!
//! The surface is deliberately narrow: a provider is a pair of hooks,
//! `resolve_id` and `load`. `Option`-returning hooks signal fallthrough so
//! the host (or the next plugin) can apply its default behavior.
//!
//! ## Example
//!
//! ```ignore
//! use httpfile_core::{HttpPlugin, PluginContainer};
//!
//! let mut plugins = PluginContainer::new();
//! plugins.add(Box::new(HttpPlugin::new()?));
//! let decision = plugins.resolve_id("https://a.test/lib.mjs", None)?;
//! ```

use crate::canon::ModuleUrl;
use crate::content::ContentKind;
use crate::fetch::HttpClient;
use crate::loader::HttpLoader;
use crate::resolver::HttpResolver;
use async_trait::async_trait;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    pub(crate) fn new(plugin: &str, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.to_string(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// Result of the resolve hook.
#[derive(Debug, Clone)]
pub struct ResolveIdResult {
    /// Canonical module id this plugin will answer `load` for.
    pub id: String,
    /// Whether this module is external (don't bundle).
    pub external: bool,
}

impl ResolveIdResult {
    /// Create a resolved module result.
    pub fn resolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }

    /// Create an external module result.
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: true,
        }
    }
}

/// Result of the load hook.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Module source text.
    pub code: String,
    /// How the host should parse it.
    pub kind: ContentKind,
}

impl LoadResult {
    /// Create a load result with an explicit kind.
    pub fn new(code: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            code: code.into(),
            kind,
        }
    }

    /// Create a script load result.
    pub fn code(code: impl Into<String>) -> Self {
        Self::new(code, ContentKind::Script)
    }
}

/// A module provider plugged into the host bundler.
///
/// The host may invoke both hooks concurrently for many modules while
/// walking the dependency graph, so implementations take `&self` and must
/// be `Send + Sync`.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Resolve a module specifier to an id.
    ///
    /// Return `Some(result)` to handle this resolution, or `None` to let
    /// the next plugin or the default resolver handle it.
    fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        Ok(None)
    }

    /// Load a module by id.
    ///
    /// Return `Some(result)` to provide the module source, or `None` to let
    /// the next plugin or the default loader handle it.
    async fn load(&self, _id: &str) -> HookResult<Option<LoadResult>> {
        Ok(None)
    }
}

/// A container dispatching hooks across registered plugins.
///
/// First non-`None` answer wins; insertion order is dispatch order.
#[derive(Default)]
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Try to resolve a specifier through plugins.
    /// Returns `None` if no plugin handled the resolution.
    pub fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.resolve_id(specifier, importer)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Try to load a module through plugins.
    /// Returns `None` if no plugin handled the load.
    pub async fn load(&self, id: &str) -> HookResult<Option<LoadResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.load(id).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

/// The HTTP(S) virtual-module provider.
///
/// Composes the resolver and loader: specifiers that name (or resolve to)
/// remote URLs are claimed, fetched, cached, and handed back to the host as
/// source text plus a content kind. Everything else falls through.
pub struct HttpPlugin {
    resolver: HttpResolver,
    loader: HttpLoader,
}

impl HttpPlugin {
    pub const NAME: &'static str = "httpfile";

    /// Create the plugin with a fresh cache and default HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, crate::Error> {
        Ok(Self::with_client(HttpClient::new()?))
    }

    /// Create the plugin around an existing client (tests inject one with
    /// custom redirect or timeout policies here).
    #[must_use]
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            resolver: HttpResolver::new(),
            loader: HttpLoader::new(client),
        }
    }

    /// The loader, exposed for cache inspection.
    #[must_use]
    pub fn loader(&self) -> &HttpLoader {
        &self.loader
    }
}

#[async_trait]
impl Plugin for HttpPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        // An importer we did not produce is not a remote module; resolving
        // relative specifiers against it is the host's business.
        let importer_url = importer.and_then(|i| ModuleUrl::parse(i).ok());

        let resolved = self
            .resolver
            .resolve(specifier, importer_url.as_ref())
            .map_err(|e| PluginError::new(Self::NAME, "resolve_id", e.to_string()))?;

        Ok(resolved.map(|url| ResolveIdResult::resolved(url.as_str())))
    }

    async fn load(&self, id: &str) -> HookResult<Option<LoadResult>> {
        // Only ids we resolved (canonical http(s) URLs) are ours to load.
        let Ok(url) = ModuleUrl::parse(id) else {
            return Ok(None);
        };

        let module = self
            .loader
            .load(&url)
            .await
            .map_err(|e| PluginError::new(Self::NAME, "load", e.to_string()))?;

        Ok(Some(LoadResult::new(module.text(), module.kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_plugin_resolves_absolute() {
        let plugin = HttpPlugin::new().unwrap();
        let result = plugin
            .resolve_id("https://a.test/lib.mjs", None)
            .unwrap()
            .unwrap();
        assert_eq!(result.id, "https://a.test/lib.mjs");
        assert!(!result.external);
    }

    #[test]
    fn test_http_plugin_resolves_relative_to_remote_importer() {
        let plugin = HttpPlugin::new().unwrap();
        let result = plugin
            .resolve_id("./x.mjs", Some("https://a.test/dir/mod.mjs"))
            .unwrap()
            .unwrap();
        assert_eq!(result.id, "https://a.test/dir/x.mjs");
    }

    #[test]
    fn test_http_plugin_declines_bare() {
        let plugin = HttpPlugin::new().unwrap();
        let result = plugin
            .resolve_id("lodash", Some("https://a.test/mod.mjs"))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_http_plugin_declines_local_importer() {
        let plugin = HttpPlugin::new().unwrap();
        let result = plugin
            .resolve_id("./util.mjs", Some("/home/user/project/index.mjs"))
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_http_plugin_load_declines_non_url_id() {
        let plugin = HttpPlugin::new().unwrap();
        let result = plugin.load("/home/user/project/index.mjs").await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_container_first_non_none_wins() {
        struct Fixed(&'static str);

        #[async_trait]
        impl Plugin for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            fn resolve_id(
                &self,
                _specifier: &str,
                _importer: Option<&str>,
            ) -> HookResult<Option<ResolveIdResult>> {
                Ok(Some(ResolveIdResult::resolved(self.0)))
            }
        }

        let mut container = PluginContainer::new();
        container.add(Box::new(Fixed("first")));
        container.add(Box::new(Fixed("second")));

        let result = container.resolve_id("x", None).unwrap().unwrap();
        assert_eq!(result.id, "first");
    }
}
