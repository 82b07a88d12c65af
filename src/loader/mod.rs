//! Lazy acquisition of the remote editing engine.
//!
//! The loader fetches each resource location at most once per
//! [`ResourceCache`], no matter how many widgets ask concurrently. Requests
//! return tickets that settle together when the single fetch completes.
//!
//! - [`ResourceLoader::ensure_script`]: fetch-once script acquisition
//! - [`ResourceLoader::ensure_style`]: synchronous, idempotent stylesheet link
//! - [`ResourceLoader::ensure_engine_available`]: script + module resolution

mod cache;
mod fetch;

pub use cache::{LoadOutcome, LoadTicket, ResourceCache, ResourceStatus};
pub use fetch::{Fetcher, HttpFetcher, MAX_RESOURCE_BYTES};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::engine::{EngineConstructor, ManifestResolver, ModuleResolver};
use crate::host::{HostDocument, ResourceKind, ResourceRef};
use cache::Acquire;

pub const DEFAULT_SCRIPT_URL: &str = "https://unpkg.com/markpad-engine@1/dist/engine.json";
pub const DEFAULT_STYLE_URL: &str = "https://unpkg.com/markpad-engine@1/dist/engine.css";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceLoadError {
    #[error("invalid resource location `{url}`: {reason}")]
    InvalidLocation { url: String, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: usize },

    #[error("{url} is not a usable engine bundle: {reason}")]
    Malformed { url: String, reason: String },

    #[error("load of {url} was abandoned before it settled")]
    Abandoned { url: String },
}

impl ResourceLoadError {
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidLocation { url, .. }
            | Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::TooLarge { url, .. }
            | Self::Malformed { url, .. }
            | Self::Abandoned { url } => url,
        }
    }
}

/// Where the engine script and its stylesheet live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocations {
    pub script: String,
    pub style: String,
}

impl Default for ResourceLocations {
    fn default() -> Self {
        Self {
            script: DEFAULT_SCRIPT_URL.to_string(),
            style: DEFAULT_STYLE_URL.to_string(),
        }
    }
}

type ModuleOutcome = Result<Arc<dyn EngineConstructor>, ResourceLoadError>;

/// Fetches, caches and resolves the editing engine's resources.
///
/// Share one loader (behind an `Arc`) between every widget that should see
/// the same cache.
pub struct ResourceLoader {
    cache: ResourceCache,
    fetcher: Arc<dyn Fetcher>,
    document: Arc<dyn HostDocument>,
    resolver: Arc<dyn ModuleResolver>,
    locations: ResourceLocations,
    modules: Mutex<HashMap<String, ModuleOutcome>>,
}

impl ResourceLoader {
    /// Create a loader with a fresh cache, the manifest resolver and the
    /// default resource locations.
    pub fn new(fetcher: Arc<dyn Fetcher>, document: Arc<dyn HostDocument>) -> Self {
        Self {
            cache: ResourceCache::new(),
            fetcher,
            document,
            resolver: Arc::new(ManifestResolver),
            locations: ResourceLocations::default(),
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Share an existing cache instead of the loader's own.
    pub fn with_cache(mut self, cache: ResourceCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_locations(mut self, locations: ResourceLocations) -> Self {
        self.locations = locations;
        self
    }

    pub const fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub const fn locations(&self) -> &ResourceLocations {
        &self.locations
    }

    /// Request the script at `location`.
    ///
    /// The first request for a location appends its script reference to the
    /// host document and starts a fetch on a worker thread; later requests
    /// join it or settle immediately from the cache.
    pub fn ensure_script(&self, location: &str) -> LoadTicket {
        let url = match normalize(location) {
            Ok(url) => url,
            Err(err) => return LoadTicket::settled(location, Err(err)),
        };
        let key = url.as_str().to_string();
        match self.cache.acquire(&key) {
            Acquire::Settled(outcome) => LoadTicket::settled(key, outcome),
            Acquire::Joined(rx) => {
                debug!(url = %key, "joined in-flight script load");
                LoadTicket::pending(key, rx)
            }
            Acquire::Started { rx, generation } => {
                self.insert_reference(ResourceKind::Script, &key);
                self.spawn_fetch(url, generation);
                LoadTicket::pending(key, rx)
            }
        }
    }

    /// Link the stylesheet at `location` unless the document already has it.
    ///
    /// Returns `true` if a reference was inserted. Invalid locations are
    /// logged and skipped.
    pub fn ensure_style(&self, location: &str) -> bool {
        match normalize(location) {
            Ok(url) => self.insert_reference(ResourceKind::Style, url.as_str()),
            Err(err) => {
                warn!(error = %err, "skipping stylesheet");
                false
            }
        }
    }

    /// Request the engine constructor behind the configured script location.
    pub fn ensure_engine_available(&self) -> EngineTicket {
        EngineTicket {
            script: self.ensure_script(&self.locations.script),
            resolved: None,
        }
    }

    /// Forget everything known about `location`, so the next request fetches
    /// and resolves it again.
    pub fn forget(&self, location: &str) {
        let key = normalize(location).map_or_else(|_| location.to_string(), String::from);
        self.cache.forget(&key);
        self.modules().remove(&key);
    }

    fn modules(&self) -> MutexGuard<'_, HashMap<String, ModuleOutcome>> {
        match self.modules.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn insert_reference(&self, kind: ResourceKind, href: &str) -> bool {
        if self.document.has_reference(kind, href) {
            return false;
        }
        self.document.append_reference(ResourceRef::new(kind, href));
        debug!(%kind, href, "inserted resource reference");
        true
    }

    fn spawn_fetch(&self, url: Url, generation: u64) {
        let cache = self.cache.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let key = url.as_str().to_string();
        debug!(url = %key, generation, "starting script fetch");

        let spawned = thread::Builder::new()
            .name("markpad-fetch".to_string())
            .spawn(move || {
                let outcome: LoadOutcome = fetcher.fetch(&url).map(Arc::from);
                match &outcome {
                    Ok(bytes) => debug!(url = %url, bytes = bytes.len(), "script fetched"),
                    Err(err) => debug!(url = %url, error = %err, "script fetch failed"),
                }
                cache.settle(url.as_str(), generation, outcome);
            });

        if let Err(err) = spawned {
            self.cache.settle(
                &key,
                generation,
                Err(ResourceLoadError::Network {
                    url: key.clone(),
                    reason: format!("could not start fetch thread: {err}"),
                }),
            );
        }
    }

    /// Turn a fetched script into a constructor, once per location.
    fn resolve_module(&self, url: &str, bytes: &[u8]) -> ModuleOutcome {
        let mut modules = self.modules();
        if let Some(outcome) = modules.get(url) {
            return outcome.clone();
        }
        let outcome = self
            .resolver
            .resolve(bytes)
            .map_err(|err| ResourceLoadError::Malformed {
                url: url.to_string(),
                reason: err.to_string(),
            });
        if let Ok(constructor) = &outcome {
            debug!(url, engine = constructor.name(), "engine module resolved");
        }
        modules.insert(url.to_string(), outcome.clone());
        outcome
    }
}

impl std::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("cache", &self.cache)
            .field("locations", &self.locations)
            .finish_non_exhaustive()
    }
}

/// A pending request for the engine constructor.
pub struct EngineTicket {
    script: LoadTicket,
    resolved: Option<ModuleOutcome>,
}

impl EngineTicket {
    pub fn url(&self) -> &str {
        self.script.url()
    }

    /// Non-blocking check; resolves the module through `loader` once the
    /// script has settled.
    pub fn poll(&mut self, loader: &ResourceLoader) -> Option<ModuleOutcome> {
        if self.resolved.is_none() {
            let outcome = self.script.poll()?;
            self.resolved = Some(
                outcome.and_then(|bytes| loader.resolve_module(self.script.url(), &bytes)),
            );
        }
        self.resolved.clone()
    }

    /// Block until the engine is available or `timeout` elapses.
    pub fn wait(self, loader: &ResourceLoader, timeout: Duration) -> Option<ModuleOutcome> {
        if let Some(resolved) = self.resolved {
            return Some(resolved);
        }
        let url = self.script.url().to_string();
        let outcome = self.script.wait(timeout)?;
        Some(outcome.and_then(|bytes| loader.resolve_module(&url, &bytes)))
    }
}

impl std::fmt::Debug for EngineTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineTicket")
            .field("script", &self.script)
            .field("resolved", &self.resolved.as_ref().map(Result::is_ok))
            .finish()
    }
}

fn normalize(location: &str) -> Result<Url, ResourceLoadError> {
    Url::parse(location).map_err(|err| ResourceLoadError::InvalidLocation {
        url: location.to_string(),
        reason: err.to_string(),
    })
}
