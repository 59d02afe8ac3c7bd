//! In-process cache storage

use crate::cache::{
    ensure_cacheable_method, validate_cache_name, CacheEntry, CacheKey, CacheStorage,
};
use crate::error::StriderResult;
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

type Entries = HashMap<CacheKey, CacheEntry>;

/// Cache storage that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, Entries>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> StriderResult<()> {
        validate_cache_name(name)?;
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn has(&self, name: &str) -> StriderResult<bool> {
        Ok(self.caches.read().await.contains_key(name))
    }

    async fn keys(&self) -> StriderResult<Vec<String>> {
        let mut names: Vec<String> = self.caches.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> StriderResult<bool> {
        Ok(self.caches.write().await.remove(name).is_some())
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> StriderResult<Option<Response>> {
        let key = CacheKey::from_request(request);
        Ok(self
            .caches
            .read()
            .await
            .get(name)
            .and_then(|entries| entries.get(&key))
            .map(|entry| entry.response.clone()))
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> StriderResult<()> {
        validate_cache_name(name)?;
        ensure_cacheable_method(request)?;
        let key = CacheKey::from_request(request);
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(key.clone(), CacheEntry::new(key, response));
        Ok(())
    }

    async fn entries(&self, name: &str) -> StriderResult<Vec<CacheEntry>> {
        let mut entries: Vec<CacheEntry> = self
            .caches
            .read()
            .await
            .get(name)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.key.url.cmp(&b.key.url));
        Ok(entries)
    }
}
