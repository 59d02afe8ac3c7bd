//! Strider - Offline asset cache worker for GoWalking
//!
//! Models the web client's background worker: versioned asset caches
//! seeded at install, stale caches purged on activation, cache-first
//! request handling with an offline fallback, push notifications and
//! install-prompt relay to open windows.

pub mod cache;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod http;
pub mod install_prompt;
pub mod journal;
pub mod notifications;
pub mod registration;
pub mod ui;
pub mod worker;

#[cfg(test)]
mod testing;

pub use error::{StriderError, StriderResult};
