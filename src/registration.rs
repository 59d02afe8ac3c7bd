//! Persisted worker registration
//!
//! Records which worker version is active and which one is waiting, so that
//! separate CLI invocations observe a single lifecycle.

use crate::config::ConfigManager;
use crate::error::{StriderError, StriderResult};
use crate::worker::WorkerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// One worker version as recorded on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Version tag (also the cache name)
    pub version: String,

    pub state: WorkerState,

    pub installed_at: DateTime<Utc>,

    pub activated_at: Option<DateTime<Utc>>,

    /// Manifest entries written at install
    pub entries: usize,
}

impl WorkerRecord {
    /// Record for a version that just finished installing
    pub fn installed(version: impl Into<String>, entries: usize) -> Self {
        Self {
            version: version.into(),
            state: WorkerState::Installed,
            installed_at: Utc::now(),
            activated_at: None,
            entries,
        }
    }
}

/// Registration record for one application origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Origin the worker controls
    pub scope: String,

    /// Version currently serving fetches
    pub active: Option<WorkerRecord>,

    /// Installed version waiting to activate
    pub waiting: Option<WorkerRecord>,

    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            active: None,
            waiting: None,
            updated_at: Utc::now(),
        }
    }

    /// Default on-disk location
    pub fn default_path() -> PathBuf {
        ConfigManager::registration_path()
    }

    /// A freshly installed version becomes the waiting worker
    pub fn set_waiting(&mut self, record: WorkerRecord) {
        self.waiting = Some(record);
        self.updated_at = Utc::now();
    }

    /// Promote the waiting worker; the previous active one is returned
    pub fn promote_waiting(&mut self) -> StriderResult<Option<WorkerRecord>> {
        let mut record = self
            .waiting
            .take()
            .ok_or_else(|| StriderError::InvalidTransition {
                action: "activate".to_string(),
                state: "no waiting worker".to_string(),
            })?;
        record.state = WorkerState::Activated;
        record.activated_at = Some(Utc::now());
        self.updated_at = Utc::now();

        let previous = self.active.replace(record).map(|mut old| {
            old.state = WorkerState::Redundant;
            old
        });
        Ok(previous)
    }

    /// Load the registration; a missing file means nothing is registered
    pub async fn load(path: &Path) -> StriderResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            StriderError::io(format!("reading registration {}", path.display()), e)
        })?;

        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn save(&self, path: &Path) -> StriderResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StriderError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            StriderError::io(format!("writing registration {}", path.display()), e)
        })
    }

    /// Remove the registration file
    pub async fn delete(path: &Path) -> StriderResult<()> {
        if path.exists() {
            fs::remove_file(path).await.map_err(|e| {
                StriderError::io(format!("deleting registration {}", path.display()), e)
            })?;
        }
        Ok(())
    }
}
