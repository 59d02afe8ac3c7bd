//! Test doubles shared by unit tests

use crate::cache::{CacheEntry, CacheStorage};
use crate::error::{StriderError, StriderResult};
use crate::fetch::Fetcher;
use crate::http::{Request, Response, ResponseType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fetcher answering from a fixed route table and counting calls
///
/// Unrouted URLs answer 404. When offline every call fails.
#[derive(Default)]
pub(crate) struct StubFetcher {
    routes: HashMap<String, Response>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, url: &str, response: Response) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    pub(crate) fn ok(self, url: &str, body: &str) -> Self {
        self.route(url, Response::new(200, body, ResponseType::Basic))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> StriderResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StriderError::network(request.url.as_str(), "offline"));
        }
        Ok(self
            .routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found", ResponseType::Basic)))
    }
}

/// Storage wrapper whose deletes or existence checks always fail
pub(crate) struct FlakyStorage {
    inner: Arc<dyn CacheStorage>,
    fail_deletes: bool,
    fail_has: bool,
}

impl FlakyStorage {
    pub(crate) fn failing_deletes(inner: Arc<dyn CacheStorage>) -> Self {
        Self {
            inner,
            fail_deletes: true,
            fail_has: false,
        }
    }

    pub(crate) fn failing_has(inner: Arc<dyn CacheStorage>) -> Self {
        Self {
            inner,
            fail_deletes: false,
            fail_has: true,
        }
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> StriderResult<()> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> StriderResult<bool> {
        if self.fail_has {
            return Err(StriderError::storage(name, "unreadable"));
        }
        self.inner.has(name).await
    }

    async fn keys(&self) -> StriderResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> StriderResult<bool> {
        if self.fail_deletes {
            return Err(StriderError::storage(name, "permission denied"));
        }
        self.inner.delete(name).await
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> StriderResult<Option<Response>> {
        self.inner.match_request(name, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> StriderResult<()> {
        self.inner.put(name, request, response).await
    }

    async fn entries(&self, name: &str) -> StriderResult<Vec<CacheEntry>> {
        self.inner.entries(name).await
    }
}
