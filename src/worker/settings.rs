//! Resolved worker configuration

use crate::config::schema::WorkerSettings;
use crate::error::{StriderError, StriderResult};
use crate::http::same_origin;
use url::Url;

/// Version tag, origin, manifest and allow-list with every URL resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub version: String,
    pub origin: Url,
    pub manifest: Vec<Url>,
    pub allowed_hosts: Vec<String>,
    pub root: Url,
    pub map_view: Url,
}

impl WorkerConfig {
    /// Worker with an empty manifest and no external hosts
    pub fn new(version: impl Into<String>, origin: &str) -> StriderResult<Self> {
        let origin = parse_origin(origin)?;
        Ok(Self {
            version: version.into(),
            root: origin.clone(),
            map_view: join(&origin, "/map")?,
            origin,
            manifest: vec![],
            allowed_hosts: vec![],
        })
    }

    /// Resolve configured settings
    pub fn from_settings(settings: &WorkerSettings) -> StriderResult<Self> {
        let mut config = Self::new(settings.version.clone(), &settings.origin)?
            .with_manifest(settings.manifest.iter().map(String::as_str))?
            .with_allowed_hosts(settings.allowed_hosts.iter().map(String::as_str));
        config.root = join(&config.origin, &settings.root_path)?;
        config.map_view = join(&config.origin, &settings.map_path)?;
        Ok(config)
    }

    /// Replace the manifest; relative entries resolve against the origin
    pub fn with_manifest<'a>(
        mut self,
        entries: impl IntoIterator<Item = &'a str>,
    ) -> StriderResult<Self> {
        let manifest = entries
            .into_iter()
            .map(|entry| join(&self.origin, entry))
            .collect::<StriderResult<Vec<_>>>()?;
        self.manifest = manifest;
        Ok(self)
    }

    /// Same configuration under a different version tag
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_allowed_hosts<'a>(mut self, hosts: impl IntoIterator<Item = &'a str>) -> Self {
        self.allowed_hosts = hosts
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        self
    }

    /// Name of the Named Cache owned by this version
    pub fn cache_name(&self) -> &str {
        &self.version
    }

    /// Resolve a path against the application origin
    pub fn resolve(&self, path: &str) -> StriderResult<Url> {
        join(&self.origin, path)
    }

    /// Whether requests to `url` may be intercepted and cached
    ///
    /// Same-origin URLs always qualify. External hosts qualify when they
    /// equal an allow-listed host or are a subdomain of one
    /// (`a.tile.openstreetmap.org` under `tile.openstreetmap.org`).
    pub fn is_eligible(&self, url: &Url) -> bool {
        if same_origin(&self.origin, url) {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        self.allowed_hosts.iter().any(|allowed| {
            host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

fn parse_origin(origin: &str) -> StriderResult<Url> {
    let url = Url::parse(origin).map_err(|e| StriderError::OriginInvalid {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(StriderError::OriginInvalid {
            origin: origin.to_string(),
            reason: "expected an http(s) URL with a host".to_string(),
        });
    }

    // Keep only scheme, host and port
    let mut base = url;
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

fn join(base: &Url, path: &str) -> StriderResult<Url> {
    base.join(path).map_err(|e| StriderError::url(path, e))
}
