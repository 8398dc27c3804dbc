//! # stalecache - An In-Process Cache With Whole-Cache Expiry
//!
//! stalecache is a thread-safe, in-memory key-value cache. All entries share
//! one TTL, expired entries stay readable until they are purged on request,
//! and a background notifier invokes a callback once per TTL period.
//!
//! ## Features
//!
//! - **Thread Safe**: One `RwLock` around the map; share the cache with `Arc`
//! - **Whole-Cache TTL**: Every write stamps the entry with `now + ttl`
//! - **Stale Reads**: `get` returns expired values; purge with `delete_expired`
//! - **Expiration Callback**: Fired from a background notifier every TTL
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                     stalecache                         │
//! │                                                        │
//! │  callers ──set/get/replace/delete/flush──> Cache<V>    │
//! │                                              │         │
//! │                                              │ owns    │
//! │                                              ▼         │
//! │                                   ┌────────────────┐   │
//! │  callback <──── every ttl ─────── │    Notifier    │   │
//! │                                   └────────────────┘   │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use stalecache::Cache;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = Arc::new(Cache::new(Duration::from_secs(60)));
//!
//!     // Purge expired entries every time the cache expires
//!     let weak = Arc::downgrade(&cache);
//!     cache.set_expired_callback(move || {
//!         if let Some(cache) = weak.upgrade() {
//!             cache.delete_expired();
//!         }
//!     });
//!
//!     cache.set("user:1", "Ariz".to_string());
//!     assert_eq!(cache.get("user:1").as_deref(), Some("Ariz"));
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The cache and its background notifier
//! - [`config`]: Construction options, including environment variables
//! - [`error`]: The error returned by `replace`
//!
//! ## Lifetime Of The Notifier
//!
//! The notifier stops when the cache is dropped. It can also be stopped with
//! [`Cache::shutdown`], or with [`Cache::close`] to wait for the task to exit.
//! A callback that captures a strong `Arc` to its own cache keeps the cache
//! alive; capture a `Weak` instead, or call `shutdown` explicitly.

pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::CacheConfig;
pub use error::NotFoundError;
pub use storage::{Cache, CacheStats, Entry, ExpiredCallback, Notifier};

/// Version of stalecache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
