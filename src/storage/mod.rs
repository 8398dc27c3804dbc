//! Storage Module
//!
//! This module provides the cache itself and the background notifier that
//! fires the expiration callback.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                Cache<V>                 │
//! │   RwLock<HashMap<String, Entry<V>>>     │
//! └─────────────────────────────────────────┘
//!                     ▲ owns
//!                     │
//!       ┌─────────────┴─────────────┐
//!       │         Notifier          │
//!       │  (Background Tokio Task)  │
//!       └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Single RwLock**: Multiple concurrent readers, exclusive writers
//! - **Whole-Cache TTL**: Every entry expires one TTL after its last write
//! - **No Eviction**: Expired entries stay readable until `delete_expired`
//! - **Notifier**: Invokes a callback once per TTL period
//!
//! ## Example
//!
//! ```
//! use stalecache::storage::Cache;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = Cache::new(Duration::from_millis(50));
//!
//! cache.set("session", "token123");
//! tokio::time::sleep(Duration::from_millis(60)).await;
//!
//! // Still readable after expiry
//! assert_eq!(cache.get("session"), Some("token123"));
//!
//! cache.delete_expired();
//! assert_eq!(cache.get("session"), None);
//! # }
//! ```

pub mod engine;
pub mod notifier;

// Re-export commonly used types
pub use engine::{Cache, CacheStats, Entry};
pub use notifier::{ExpiredCallback, Notifier};
