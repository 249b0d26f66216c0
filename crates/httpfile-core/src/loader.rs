//! Module loading and caching.
//!
//! The loader owns the bundle-run cache and the in-flight fetch registry.
//! Concurrent loads of the same id converge on a single network fetch: the
//! first caller installs a shared future, later callers clone and await it,
//! and everyone observes the same `Arc<FetchedModule>` (or the same failure).
//!
//! Redirects cache under the final canonical id reached, with an alias from
//! the originally requested id, so repeat loads skip the redirect round-trip.
//! A fetch that never completes never populates a cache entry; failed fetches
//! leave nothing behind, so a later load may try again.

use crate::canon::ModuleUrl;
use crate::content::{infer_kind, ContentKind};
use crate::fetch::{FetchedResponse, HttpClient, LoadError};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use rustc_hash::FxHashMap as HashMap;
use std::borrow::Cow;
use std::sync::{Arc, Mutex, Weak};
use std::time::SystemTime;

/// A fetched remote module, owned by the cache.
///
/// Callers only ever see this behind an `Arc`; the cache keeps the original
/// and hands out shared views.
#[derive(Debug)]
pub struct FetchedModule {
    /// Final canonical id (post-redirect).
    pub url: ModuleUrl,
    /// Raw response body.
    pub bytes: Bytes,
    /// Inferred content kind.
    pub kind: ContentKind,
    /// When the fetch completed.
    pub fetched_at: SystemTime,
}

impl FetchedModule {
    /// Content as text, for the host's parser. Lossy for non-UTF-8 bodies;
    /// the raw bytes stay available on `bytes`.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<FetchedModule>, LoadError>>>;

#[derive(Default)]
struct CacheState {
    /// Completed fetches, keyed by canonical id (plus redirect aliases).
    ready: HashMap<ModuleUrl, Arc<FetchedModule>>,
    /// At most one pending fetch per id.
    in_flight: HashMap<ModuleUrl, SharedFetch>,
}

/// Loader for remote modules, scoped to one bundle run.
///
/// Cheap to clone; clones share the same cache. Every method takes `&self`
/// and is safe to call from many tasks at once — the cache mutex is the only
/// synchronization point, and it is never held across an await.
#[derive(Clone)]
pub struct HttpLoader {
    client: HttpClient,
    state: Arc<Mutex<CacheState>>,
}

impl HttpLoader {
    /// Create a loader with a fresh cache.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Load a module, from cache or network.
    ///
    /// # Errors
    /// Propagates the underlying [`LoadError`] for non-2xx responses,
    /// timeouts, and connection failures. Never retries.
    pub async fn load(&self, url: &ModuleUrl) -> Result<Arc<FetchedModule>, LoadError> {
        let fetch = {
            let mut state = self.state.lock().expect("module cache poisoned");

            if let Some(module) = state.ready.get(url) {
                tracing::trace!(url = %url, "module cache hit");
                return Ok(Arc::clone(module));
            }

            if let Some(pending) = state.in_flight.get(url) {
                tracing::trace!(url = %url, "joining in-flight fetch");
                pending.clone()
            } else {
                let fetch = self.spawn_fetch(url.clone());
                state.in_flight.insert(url.clone(), fetch.clone());
                fetch
            }
        };

        fetch.await
    }

    /// Peek at a cached module without touching the network.
    #[must_use]
    pub fn cached(&self, url: &ModuleUrl) -> Option<Arc<FetchedModule>> {
        self.state
            .lock()
            .expect("module cache poisoned")
            .ready
            .get(url)
            .map(Arc::clone)
    }

    /// Number of cache entries (redirect aliases count separately).
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.state.lock().expect("module cache poisoned").ready.len()
    }

    /// Build the shared fetch future for one id.
    ///
    /// The future holds only a weak reference to the cache: an in-flight
    /// entry must not keep the cache alive after the bundle run drops it.
    fn spawn_fetch(&self, url: ModuleUrl) -> SharedFetch {
        let client = self.client.clone();
        let state: Weak<Mutex<CacheState>> = Arc::downgrade(&self.state);

        async move {
            let result = client.fetch(&url).await;

            let Some(state) = state.upgrade() else {
                // Bundle run already torn down; nothing to record.
                return result.map(|resp| Arc::new(into_module(resp)));
            };
            let mut state = state.lock().expect("module cache poisoned");
            state.in_flight.remove(&url);

            match result {
                Ok(resp) => {
                    let module = Arc::new(into_module(resp));
                    tracing::debug!(
                        url = %module.url,
                        kind = module.kind.as_str(),
                        bytes = module.bytes.len(),
                        "fetched module"
                    );
                    state.ready.insert(module.url.clone(), Arc::clone(&module));
                    if module.url != url {
                        // Redirect: alias the requested id to the same entry.
                        tracing::debug!(from = %url, to = %module.url, "caching redirect alias");
                        state.ready.insert(url, Arc::clone(&module));
                    }
                    Ok(module)
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "fetch failed");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn into_module(resp: FetchedResponse) -> FetchedModule {
    let kind = infer_kind(&resp.final_url, resp.content_type.as_deref());
    FetchedModule {
        url: resp.final_url,
        bytes: resp.bytes,
        kind,
        fetched_at: SystemTime::now(),
    }
}
