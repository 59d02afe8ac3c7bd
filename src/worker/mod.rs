//! Offline asset cache worker
//!
//! Makes the web client partially usable without connectivity by serving
//! previously fetched assets, while keeping exactly one Named Cache per
//! deployed version.
//!
//! # Lifecycle
//!
//! | State | Entered by | Leaves on |
//! |-------|------------|-----------|
//! | Parsed | construction | `install()` |
//! | Installing | `install()` | manifest written / failure |
//! | Installed | manifest written (skip-waiting requested) | `activate()` |
//! | InstallFailed | manifest failure | never (discarded) |
//! | Activating | `activate()` | stale caches purged, clients claimed |
//! | Activated | activation complete | superseded |
//! | Redundant | superseded by a newer version | never |
//!
//! Fetch interception only happens while Activated.

mod asset_cache;
mod settings;
mod state;

pub use asset_cache::{ActivationReport, AssetCache, FetchOutcome, ResponseSource};
pub use settings::WorkerConfig;
pub use state::WorkerState;
