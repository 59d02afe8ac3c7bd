//! File-backed cache storage
//!
//! Layout: `<root>/<cache name>/<key hash>.json`, one JSON document per
//! entry. Writes go to a temporary file first and are renamed into place.

use crate::cache::{
    ensure_cacheable_method, validate_cache_name, CacheEntry, CacheKey, CacheStorage,
};
use crate::error::{StriderError, StriderResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Cache storage persisted under a directory
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &str) -> StriderResult<PathBuf> {
        validate_cache_name(name)?;
        Ok(self.root.join(name))
    }

    fn entry_path(&self, name: &str, key: &CacheKey) -> StriderResult<PathBuf> {
        Ok(self
            .cache_dir(name)?
            .join(format!("{}.json", key.file_stem())))
    }

    async fn read_entry(path: &Path) -> StriderResult<Option<CacheEntry>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StriderError::io(format!("reading cache entry {}", path.display()), e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> StriderResult<()> {
        let dir = self.cache_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StriderError::io(format!("creating cache {}", dir.display()), e))
    }

    async fn has(&self, name: &str) -> StriderResult<bool> {
        Ok(self.cache_dir(name)?.is_dir())
    }

    async fn keys(&self) -> StriderResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StriderError::io("reading cache storage directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StriderError::io("reading cache storage entry", e))?
        {
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> StriderResult<bool> {
        let dir = self.cache_dir(name)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| StriderError::io(format!("deleting cache {}", dir.display()), e))?;
        debug!("Deleted cache directory {}", dir.display());
        Ok(true)
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> StriderResult<Option<Response>> {
        let key = CacheKey::from_request(request);
        let path = self.entry_path(name, &key)?;

        match Self::read_entry(&path).await? {
            // Hash collisions are treated as misses
            Some(entry) if entry.key == key => Ok(Some(entry.response)),
            Some(_) => Ok(None),
            None => Ok(None),
        }
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> StriderResult<()> {
        ensure_cacheable_method(request)?;
        self.open(name).await?;

        let key = CacheKey::from_request(request);
        let path = self.entry_path(name, &key)?;
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        let content = serde_json::to_string(&CacheEntry::new(key, response))?;

        fs::write(&tmp, content)
            .await
            .map_err(|e| StriderError::io(format!("writing cache entry {}", tmp.display()), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StriderError::io(format!("committing cache entry {}", path.display()), e))
    }

    async fn entries(&self, name: &str) -> StriderResult<Vec<CacheEntry>> {
        let dir = self.cache_dir(name)?;
        if !dir.exists() {
            return Err(StriderError::CacheNotFound(name.to_string()));
        }

        let mut result = vec![];
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StriderError::io(format!("reading cache {}", dir.display()), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StriderError::io("reading cache entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::read_entry(&path).await {
                    Ok(Some(entry)) => result.push(entry),
                    Ok(None) => {}
                    Err(e) => warn!("Skipping unreadable cache entry {}: {}", path.display(), e),
                }
            }
        }

        result.sort_by(|a, b| a.key.url.cmp(&b.key.url));
        Ok(result)
    }
}
