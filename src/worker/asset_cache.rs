//! Cache manager: install, activate and fetch interception

use crate::cache::CacheStorage;
use crate::clients::Clients;
use crate::error::{StriderError, StriderResult};
use crate::fetch::Fetcher;
use crate::http::{Method, Request, Response, ResponseType};
use crate::worker::{WorkerConfig, WorkerState};
use futures_util::future::try_join_all;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Where a response handed back to a client came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    /// Cached root document or synthesized offline response
    Fallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Result of offering a request to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the request goes to the network unmodified
    Passthrough,
    /// The worker answers the request
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Passthrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Self::Passthrough => None,
            Self::Respond { source, .. } => Some(*source),
        }
    }
}

/// What activation cleaned up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stale cache names that were deleted
    pub deleted: Vec<String>,
    /// Clients taken over without reload
    pub claimed: usize,
}

/// The worker's cache manager for one version tag
pub struct AssetCache {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<Clients>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
}

impl AssetCache {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<Clients>,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
        }
    }

    /// Resume a worker whose lifecycle progressed in an earlier process
    pub fn restore(self, state: WorkerState) -> Self {
        Self {
            state: RwLock::new(state),
            ..self
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Client windows this worker controls
    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    pub fn cache_name(&self) -> &str {
        self.config.cache_name()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Request activation without waiting for existing clients to close
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn is_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn begin(&self, action: &str, from: WorkerState, to: WorkerState) -> StriderResult<()> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(StriderError::InvalidTransition {
                action: action.to_string(),
                state: state.to_string(),
            });
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    /// Populate the Named Cache with the manifest
    ///
    /// All manifest URLs are fetched before anything is written; one failed
    /// or non-OK response aborts the install and discards a cache created by
    /// this attempt. On success the worker is Installed and asks to skip
    /// waiting. Returns the number of seeded entries.
    pub async fn install(&self) -> StriderResult<usize> {
        self.begin("install", WorkerState::Parsed, WorkerState::Installing)
            .await?;
        let name = self.cache_name().to_string();
        info!("Installing {} ({} manifest entries)", name, self.config.manifest.len());

        let existed = match self.storage.has(&name).await {
            Ok(existed) => existed,
            Err(e) => {
                self.set_state(WorkerState::InstallFailed).await;
                warn!("Could not check cache {}: {}", name, e);
                return Err(e);
            }
        };

        match self.populate(&name).await {
            Ok(count) => {
                self.set_state(WorkerState::Installed).await;
                self.skip_waiting();
                info!("Installed {} with {} entries", name, count);
                Ok(count)
            }
            Err(e) => {
                if !existed {
                    if let Err(cleanup) = self.storage.delete(&name).await {
                        warn!("Failed to discard cache {}: {}", name, cleanup);
                    }
                }
                self.set_state(WorkerState::InstallFailed).await;
                warn!("Install of {} failed: {}", name, e);
                Err(StriderError::InstallFailed {
                    version: self.config.version.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn populate(&self, name: &str) -> StriderResult<usize> {
        self.storage.open(name).await?;

        let fetched = try_join_all(self.config.manifest.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self.fetcher.fetch(&request).await?;
            if !response.ok() {
                return Err(StriderError::network(
                    url.as_str(),
                    format!("HTTP {}", response.status),
                ));
            }
            Ok((request, response))
        }))
        .await?;

        let count = fetched.len();
        for (request, response) in fetched {
            self.storage.put(name, &request, response).await?;
        }
        Ok(count)
    }

    /// Purge every other cache, claim clients and start controlling
    ///
    /// Deleting a stale cache is best-effort: failures are logged and do not
    /// block activation.
    pub async fn activate(&self) -> StriderResult<ActivationReport> {
        self.begin("activate", WorkerState::Installed, WorkerState::Activating)
            .await?;
        let current = self.cache_name();

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Could not enumerate caches during activation: {}", e);
                vec![]
            }
        };

        let mut report = ActivationReport::default();
        for name in names.into_iter().filter(|n| n != current) {
            match self.storage.delete(&name).await {
                Ok(true) => {
                    info!("Deleted stale cache {}", name);
                    report.deleted.push(name);
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to delete stale cache {}: {}", name, e),
            }
        }

        report.claimed = self.clients.claim().await;
        self.set_state(WorkerState::Activated).await;
        info!("Activated {}", current);
        Ok(report)
    }

    /// Decide how to answer one outgoing request
    ///
    /// Never fails: network errors degrade to the cached root document for
    /// navigations and to the offline response otherwise.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !self.state().await.is_controlling() {
            return FetchOutcome::Passthrough;
        }
        if request.method != Method::Get {
            debug!("Passthrough {} {}", request.method, request.url);
            return FetchOutcome::Passthrough;
        }
        if !self.config.is_eligible(&request.url) {
            debug!("Passthrough ineligible host {}", request.url);
            return FetchOutcome::Passthrough;
        }

        let name = self.cache_name();
        match self.storage.match_request(name, request).await {
            Ok(Some(response)) => {
                debug!("Cache hit {}", request.url);
                return FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Cache,
                };
            }
            Ok(None) => debug!("Cache miss {}", request.url),
            Err(e) => warn!("Cache lookup failed for {}: {}", request.url, e),
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if is_cacheable(&response) {
                    if let Err(e) = self.storage.put(name, request, response.duplicate()).await {
                        warn!("Failed to cache {}: {}", request.url, e);
                    }
                }
                FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Network,
                }
            }
            Err(e) => {
                debug!("Network failed for {}: {}", request.url, e);
                FetchOutcome::Respond {
                    response: self.fallback(request).await,
                    source: ResponseSource::Fallback,
                }
            }
        }
    }

    async fn fallback(&self, request: &Request) -> Response {
        if request.is_navigation() {
            let root = Request::get(self.config.root.clone());
            match self.storage.match_request(self.cache_name(), &root).await {
                Ok(Some(response)) => return response,
                Ok(None) => debug!("No cached root document"),
                Err(e) => warn!("Root document lookup failed: {}", e),
            }
        }
        Response::offline()
    }
}

/// Successful, readable responses are stored; errors and opaque ones are not
fn is_cacheable(response: &Response) -> bool {
    response.status == 200
        && matches!(
            response.response_type,
            ResponseType::Basic | ResponseType::Cors
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use crate::http::OFFLINE_BODY;
    use crate::testing::{FlakyStorage, StubFetcher};
    use url::Url;

    const ORIGIN: &str = "http://localhost:3000";

    fn url(s: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(s).unwrap()
    }

    fn worker_with(
        version: &str,
        manifest: &[&str],
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<StubFetcher>,
    ) -> AssetCache {
        let config = WorkerConfig::new(version, ORIGIN)
            .unwrap()
            .with_manifest(manifest.iter().copied())
            .unwrap()
            .with_allowed_hosts(["fonts.googleapis.com"]);
        AssetCache::new(config, storage, fetcher, Arc::new(Clients::new()))
    }

    async fn active_worker(fetcher: Arc<StubFetcher>) -> (AssetCache, Arc<MemoryCacheStorage>) {
        let storage = Arc::new(MemoryCacheStorage::new());
        let worker = worker_with("v1", &["/", "/a.js"], storage.clone(), fetcher);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        (worker, storage)
    }

    fn seeded_fetcher() -> Arc<StubFetcher> {
        Arc::new(
            StubFetcher::new()
                .ok(&format!("{}/", ORIGIN), "<html>shell</html>")
                .ok(&format!("{}/a.js", ORIGIN), "console.log('a')")
                .ok(&format!("{}/missing.js", ORIGIN), "late"),
        )
    }

    #[tokio::test]
    async fn install_seeds_manifest() {
        let fetcher = seeded_fetcher();
        let storage = Arc::new(MemoryCacheStorage::new());
        let worker = worker_with("v1", &["/", "/a.js"], storage.clone(), fetcher);

        assert_eq!(worker.install().await.unwrap(), 2);
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert!(worker.is_skip_waiting());

        for path in ["/", "/a.js"] {
            let hit = storage.match_request("v1", &Request::get(url(path))).await;
            assert!(hit.unwrap().is_some(), "{} should be cached", path);
        }
        let miss = storage
            .match_request("v1", &Request::get(url("/missing.js")))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn install_failure_discards_new_cache() {
        let fetcher = Arc::new(StubFetcher::new().ok(&format!("{}/", ORIGIN), "shell"));
        let storage = Arc::new(MemoryCacheStorage::new());
        // /a.js is not routed, the stub answers 404
        let worker = worker_with("v2", &["/", "/a.js"], storage.clone(), fetcher);

        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, StriderError::InstallFailed { .. }));
        assert!(err.to_string().contains("HTTP 404"));
        assert_eq!(worker.state().await, WorkerState::InstallFailed);
        assert!(!storage.has("v2").await.unwrap());
        assert!(!worker.is_skip_waiting());
    }

    #[tokio::test]
    async fn install_aborts_when_cache_existence_unknown() {
        let inner = Arc::new(MemoryCacheStorage::new());
        let seed = Request::get(url("/"));
        inner
            .put("v1", &seed, Response::new(200, "old shell", ResponseType::Basic))
            .await
            .unwrap();
        let storage = Arc::new(FlakyStorage::failing_has(inner.clone()));
        let fetcher = Arc::new(StubFetcher::new());
        let worker = worker_with("v1", &["/", "/a.js"], storage, fetcher.clone());

        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, StriderError::CacheStorage { .. }));
        assert_eq!(worker.state().await, WorkerState::InstallFailed);
        assert_eq!(fetcher.calls(), 0);
        let kept = inner.match_request("v1", &seed).await.unwrap().unwrap();
        assert_eq!(kept.text(), "old shell");
    }

    #[tokio::test]
    async fn install_failure_keeps_previous_version() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let v1 = worker_with("v1", &["/"], storage.clone(), seeded_fetcher());
        v1.install().await.unwrap();
        v1.activate().await.unwrap();

        let offline = Arc::new(StubFetcher::new());
        offline.set_offline(true);
        let v2 = worker_with("v2", &["/"], storage.clone(), offline);
        assert!(v2.install().await.is_err());

        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
        let outcome = v1.handle_fetch(&Request::get(url("/"))).await;
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
    }

    #[tokio::test]
    async fn install_twice_is_rejected() {
        let worker = worker_with(
            "v1",
            &["/"],
            Arc::new(MemoryCacheStorage::new()),
            seeded_fetcher(),
        );
        worker.install().await.unwrap();
        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, StriderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn activate_requires_install() {
        let worker = worker_with(
            "v1",
            &["/"],
            Arc::new(MemoryCacheStorage::new()),
            seeded_fetcher(),
        );
        let err = worker.activate().await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot activate while worker is parsed");
    }

    #[tokio::test]
    async fn activation_leaves_only_current_version() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let fetcher = seeded_fetcher();

        let v1 = worker_with("v1", &["/"], storage.clone(), fetcher.clone());
        v1.install().await.unwrap();
        let v2 = worker_with("v2", &["/"], storage.clone(), fetcher);
        v2.install().await.unwrap();

        let report = v2.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["v1"]);
        assert_eq!(storage.keys().await.unwrap(), vec!["v2"]);
        assert_eq!(v2.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn activation_survives_delete_failure() {
        let inner = Arc::new(MemoryCacheStorage::new());
        inner.open("stale").await.unwrap();
        let storage = Arc::new(FlakyStorage::failing_deletes(inner.clone()));

        let worker = worker_with("v1", &["/"], storage, seeded_fetcher());
        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();

        assert!(report.deleted.is_empty());
        assert_eq!(worker.state().await, WorkerState::Activated);
        assert!(inner.has("stale").await.unwrap());
    }

    #[tokio::test]
    async fn activation_claims_clients() {
        let clients = Arc::new(Clients::new());
        clients.register(url("/")).await;
        let config = WorkerConfig::new("v1", ORIGIN)
            .unwrap()
            .with_manifest(["/"])
            .unwrap();
        let worker = AssetCache::new(
            config,
            Arc::new(MemoryCacheStorage::new()),
            seeded_fetcher(),
            clients.clone(),
        );
        worker.install().await.unwrap();

        assert_eq!(worker.activate().await.unwrap().claimed, 1);
        assert!(clients.match_all().await[0].controlled);
    }

    #[tokio::test]
    async fn not_intercepted_before_activation() {
        let fetcher = seeded_fetcher();
        let worker = worker_with(
            "v1",
            &["/"],
            Arc::new(MemoryCacheStorage::new()),
            fetcher,
        );
        worker.install().await.unwrap();

        let outcome = worker.handle_fetch(&Request::get(url("/"))).await;
        assert_eq!(outcome, FetchOutcome::Passthrough);
    }

    #[tokio::test]
    async fn non_get_never_touches_cache() {
        let fetcher = seeded_fetcher();
        let (worker, storage) = active_worker(fetcher.clone()).await;
        let calls = fetcher.calls();

        let post = Request::new(Method::Post, url("/a.js")).with_body("{}");
        assert_eq!(worker.handle_fetch(&post).await, FetchOutcome::Passthrough);

        assert_eq!(fetcher.calls(), calls);
        assert_eq!(storage.entries("v1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn disallowed_host_passes_through() {
        let fetcher = seeded_fetcher();
        let (worker, storage) = active_worker(fetcher.clone()).await;
        let calls = fetcher.calls();

        let api = Request::get(Url::parse("https://api.example.com/route").unwrap());
        assert_eq!(worker.handle_fetch(&api).await, FetchOutcome::Passthrough);

        let backend = Request::get(Url::parse("http://localhost:8001/api/pois").unwrap());
        assert_eq!(worker.handle_fetch(&backend).await, FetchOutcome::Passthrough);

        assert_eq!(fetcher.calls(), calls);
        assert_eq!(storage.entries("v1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cached_response_served_without_network() {
        let fetcher = seeded_fetcher();
        let (worker, _storage) = active_worker(fetcher.clone()).await;
        let calls = fetcher.calls();

        let outcome = worker.handle_fetch(&Request::get(url("/a.js"))).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().text(), "console.log('a')");
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn miss_is_fetched_then_cached() {
        let fetcher = seeded_fetcher();
        let (worker, _storage) = active_worker(fetcher.clone()).await;
        let request = Request::get(url("/missing.js"));
        let calls = fetcher.calls();

        let first = worker.handle_fetch(&request).await;
        assert_eq!(first.source(), Some(ResponseSource::Network));
        assert_eq!(fetcher.calls(), calls + 1);

        let second = worker.handle_fetch(&request).await;
        assert_eq!(second.source(), Some(ResponseSource::Cache));
        assert_eq!(second.response().unwrap().text(), "late");
        assert_eq!(fetcher.calls(), calls + 1);
    }

    #[tokio::test]
    async fn error_and_opaque_responses_not_cached() {
        let fonts = "https://fonts.googleapis.com/css2?family=Inter";
        let fetcher = Arc::new(
            StubFetcher::new()
                .ok(&format!("{}/", ORIGIN), "shell")
                .ok(&format!("{}/a.js", ORIGIN), "a")
                .route(
                    &format!("{}/broken.js", ORIGIN),
                    Response::new(500, "boom", ResponseType::Basic),
                )
                .route(fonts, Response::new(0, "", ResponseType::Opaque)),
        );
        let (worker, storage) = active_worker(fetcher).await;

        let broken = worker.handle_fetch(&Request::get(url("/broken.js"))).await;
        assert_eq!(broken.response().unwrap().status, 500);
        let font = Request::get(Url::parse(fonts).unwrap());
        assert_eq!(
            worker.handle_fetch(&font).await.source(),
            Some(ResponseSource::Network)
        );

        assert_eq!(storage.entries("v1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn allow_listed_cors_response_is_cached() {
        let fonts = "https://fonts.googleapis.com/css2?family=Poppins";
        let fetcher = Arc::new(
            StubFetcher::new()
                .ok(&format!("{}/", ORIGIN), "shell")
                .ok(&format!("{}/a.js", ORIGIN), "a")
                .route(fonts, Response::new(200, "@font-face{}", ResponseType::Cors)),
        );
        let (worker, storage) = active_worker(fetcher).await;

        let request = Request::get(Url::parse(fonts).unwrap());
        worker.handle_fetch(&request).await;

        assert!(storage.match_request("v1", &request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn offline_navigation_gets_cached_root() {
        let fetcher = seeded_fetcher();
        let (worker, _storage) = active_worker(fetcher.clone()).await;
        fetcher.set_offline(true);

        let outcome = worker.handle_fetch(&Request::navigate(url("/friends"))).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Fallback));
        assert_eq!(outcome.response().unwrap().text(), "<html>shell</html>");
    }

    #[tokio::test]
    async fn offline_navigation_without_root_gets_offline_response() {
        let fetcher = Arc::new(StubFetcher::new().ok(&format!("{}/a.js", ORIGIN), "a"));
        let storage = Arc::new(MemoryCacheStorage::new());
        let worker = worker_with("v1", &["/a.js"], storage, fetcher.clone());
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        fetcher.set_offline(true);

        let outcome = worker.handle_fetch(&Request::navigate(url("/profile"))).await;
        assert_eq!(outcome.response().unwrap().status, 503);
    }

    #[tokio::test]
    async fn offline_subresource_gets_placeholder() {
        let fetcher = seeded_fetcher();
        let (worker, _storage) = active_worker(fetcher.clone()).await;
        fetcher.set_offline(true);

        let outcome = worker.handle_fetch(&Request::get(url("/static/img/logo.png"))).await;
        let response = outcome.response().unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.text(), OFFLINE_BODY);
    }

    #[tokio::test]
    async fn concurrent_fetches_of_same_resource() {
        let fetcher = seeded_fetcher();
        let (worker, storage) = active_worker(fetcher).await;
        let worker = Arc::new(worker);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let worker = worker.clone();
                tokio::spawn(async move {
                    worker
                        .handle_fetch(&Request::get(url("/missing.js")))
                        .await
                })
            })
            .collect();
        for handle in handles {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.response().unwrap().text(), "late");
        }

        assert_eq!(storage.entries("v1").await.unwrap().len(), 3);
    }

    #[test]
    fn cacheability_rules() {
        assert!(is_cacheable(&Response::new(200, "ok", ResponseType::Basic)));
        assert!(is_cacheable(&Response::new(200, "ok", ResponseType::Cors)));
        assert!(!is_cacheable(&Response::new(204, "", ResponseType::Basic)));
        assert!(!is_cacheable(&Response::new(0, "", ResponseType::Opaque)));
        assert!(!is_cacheable(&Response::network_error()));
    }
}
