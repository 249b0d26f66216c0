//! HTTP(S) virtual-module provider for a bundling pipeline.
//!
//! Import specifiers that reference remote http(s) locations (and relative
//! specifiers discovered while loading such a URL) are intercepted, fetched,
//! cached per bundle run, and handed back to the host bundler as source text
//! plus a content kind. A minimal bundling host lives in [`bundle`] so the
//! demo CLI and the tests have something to plug into.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod bundle;
pub mod canon;
pub mod content;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod plugin;
pub mod resolver;

pub use bundle::{BundleError, BundleOutput, Bundler};
pub use canon::{CanonError, ModuleUrl};
pub use content::ContentKind;
pub use error::Error;
pub use fetch::{HttpClient, LoadError};
pub use loader::{FetchedModule, HttpLoader};
pub use plugin::{
    HookResult, HttpPlugin, LoadResult, Plugin, PluginContainer, PluginError, ResolveIdResult,
};
pub use resolver::HttpResolver;
