//! CLI command implementations
//!
//! Every command rebuilds the worker from configuration plus the persisted
//! registration, so separate invocations share one lifecycle.

pub mod activate;
pub mod caches;
pub mod click;
pub mod config;
pub mod fetch;
pub mod install;
pub mod push;
pub mod status;

pub use activate::execute as activate;
pub use caches::execute as caches;
pub use click::execute as click;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use push::execute as push;
pub use status::execute as status;

use crate::cache::{CacheStorage, DiskCacheStorage};
use crate::clients::Clients;
use crate::config::{Config, ConfigManager};
use crate::error::StriderResult;
use crate::events::Dispatcher;
use crate::fetch::{Fetcher, HttpFetcher, OfflineFetcher};
use crate::notifications::Notifier;
use crate::registration::Registration;
use crate::worker::{AssetCache, WorkerConfig, WorkerState};
use std::sync::Arc;

/// On-disk Named Cache storage under the state directory
pub(crate) fn storage() -> Arc<dyn CacheStorage> {
    Arc::new(DiskCacheStorage::new(ConfigManager::caches_dir()))
}

pub(crate) fn fetcher(worker: &WorkerConfig, config: &Config, offline: bool) -> Arc<dyn Fetcher> {
    if offline {
        Arc::new(OfflineFetcher)
    } else {
        Arc::new(HttpFetcher::new(worker.origin.clone(), &config.network))
    }
}

/// Worker for `version` (the configured one when `None`) resumed in `state`
pub(crate) fn build_worker(
    config: &Config,
    version: Option<&str>,
    state: WorkerState,
    offline: bool,
) -> StriderResult<AssetCache> {
    let mut settings = WorkerConfig::from_settings(&config.worker)?;
    if let Some(version) = version {
        settings = settings.with_version(version);
    }
    let fetcher = fetcher(&settings, config, offline);
    Ok(AssetCache::new(settings, storage(), fetcher, Arc::new(Clients::new())).restore(state))
}

/// Standard event table over the active worker, showing notifications on
/// `notifier`
pub(crate) async fn event_dispatcher(
    config: &Config,
    notifier: Arc<dyn Notifier>,
) -> StriderResult<(Dispatcher, Arc<Clients>)> {
    let active = load_registration().await?.and_then(|r| r.active);
    let (version, state) = match &active {
        Some(record) => (Some(record.version.as_str()), WorkerState::Activated),
        None => (None, WorkerState::Parsed),
    };

    let worker = Arc::new(build_worker(config, version, state, false)?);
    let clients = worker.clients().clone();
    let dispatcher = Dispatcher::for_worker(worker, notifier, config.notifications.clone());
    Ok((dispatcher, clients))
}

/// Persisted registration, if any
pub(crate) async fn load_registration() -> StriderResult<Option<Registration>> {
    Registration::load(&Registration::default_path()).await
}
