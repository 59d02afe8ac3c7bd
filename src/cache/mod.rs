//! Named Cache storage for offline asset serving
//!
//! A Named Cache maps a request (method + URL) to a previously observed
//! response. Caches are identified by a version tag; exactly one of them is
//! current once the worker activates, every other tag is purged.
//!
//! # Backends
//!
//! | Backend | Persistence | Used by |
//! |---------|-------------|---------|
//! | [`MemoryCacheStorage`] | process lifetime | tests, embedding |
//! | [`DiskCacheStorage`] | state directory | CLI |

pub mod disk;
pub mod memory;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;

use crate::error::{StriderError, StriderResult};
use crate::http::{Method, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity of a cache entry: method plus URL without fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: Method,
    pub url: String,
}

impl CacheKey {
    pub fn from_request(request: &Request) -> Self {
        let mut url = request.url.clone();
        url.set_fragment(None);
        Self {
            method: request.method,
            url: url.to_string(),
        }
    }

    /// Stable file name for this key (first 16 hex chars of its SHA256)
    pub fn file_stem(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A stored request/response pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub response: Response,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, response: Response) -> Self {
        Self {
            key,
            response,
            cached_at: Utc::now(),
        }
    }
}

/// Storage of Named Caches
///
/// Each operation is atomic per entry; concurrent writers to the same key
/// resolve as last writer wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a cache, creating it if it does not exist
    async fn open(&self, name: &str) -> StriderResult<()>;

    /// Check whether a cache exists
    async fn has(&self, name: &str) -> StriderResult<bool>;

    /// Names of all existing caches, sorted
    async fn keys(&self) -> StriderResult<Vec<String>>;

    /// Delete a cache and all of its entries, returning whether it existed
    async fn delete(&self, name: &str) -> StriderResult<bool>;

    /// Look up a stored response; a missing cache is a miss
    async fn match_request(&self, name: &str, request: &Request)
        -> StriderResult<Option<Response>>;

    /// Store a response for a GET request, creating the cache if needed
    async fn put(&self, name: &str, request: &Request, response: Response) -> StriderResult<()>;

    /// All entries of a cache, sorted by URL
    async fn entries(&self, name: &str) -> StriderResult<Vec<CacheEntry>>;
}

/// Reject names that are empty or could escape a storage directory
pub fn validate_cache_name(name: &str) -> StriderResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StriderError::CacheNameInvalid(name.to_string()));
    }
    Ok(())
}

/// Only GET responses are storable
pub(crate) fn ensure_cacheable_method(request: &Request) -> StriderResult<()> {
    if request.method != Method::Get {
        return Err(StriderError::CacheMethodUnsupported(
            request.method.to_string(),
        ));
    }
    Ok(())
}
