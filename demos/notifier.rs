//! stalecache demo
//!
//! Fills a cache, lets it expire, and purges it from the expiration callback.
//!
//! ```text
//! RUST_LOG=stalecache=debug cargo run --example notifier
//! STALECACHE_TTL_MS=250 cargo run --example notifier
//! ```

use stalecache::{Cache, CacheConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = CacheConfig::from_env().with_name("demo");
    if config.ttl().is_none() {
        config = config.with_ttl(Duration::from_millis(500));
    }
    let ttl = config.ttl;

    let cache: Arc<Cache<String>> = Arc::new(Cache::with_config(config));

    let weak = Arc::downgrade(&cache);
    cache.set_expired_callback(move || {
        if let Some(cache) = weak.upgrade() {
            let before = cache.item_count();
            let purged = cache.delete_expired();
            info!(before, purged, "Cache expired");
        }
    });

    for i in 0..5 {
        cache.set(format!("user:{}", i), format!("name-{}", i));
    }
    info!(entries = cache.item_count(), ttl_ms = ttl.as_millis(), "Cache filled");

    tokio::time::sleep(ttl + ttl / 2).await;

    // Expired but possibly not yet purged: still readable
    if let Some((value, _)) = cache.get_with_expiration("user:0") {
        info!(%value, expired = ?cache.is_expired("user:0"), "Stale read");
    }

    cache.replace("user:1", "renamed".to_string()).ok();
    if let Err(e) = cache.replace("user:99", "ghost".to_string()) {
        info!(error = %e, "Replace refused");
    }

    tokio::time::sleep(ttl * 2).await;

    let stats = cache.stats();
    info!(?stats, "Final statistics");

    match Arc::try_unwrap(cache) {
        Ok(mut cache) => cache.close().await,
        Err(cache) => cache.shutdown(),
    }

    Ok(())
}
