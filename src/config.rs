//! Cache Configuration
//!
//! [`CacheConfig`] controls how long entries stay fresh and whether the
//! background notifier runs. It can be built in code or read from the
//! environment.
//!
//! ## Environment Variables
//!
//! | Variable              | Meaning                                          |
//! |-----------------------|--------------------------------------------------|
//! | `STALECACHE_TTL_MS`   | TTL in milliseconds; `<= 0` disables expiry       |
//! | `STALECACHE_NOTIFIER` | `0`, `false`, `off` or `no` disables the notifier |

use std::time::Duration;
use tracing::warn;

/// Environment variable holding the TTL in milliseconds.
pub const TTL_ENV: &str = "STALECACHE_TTL_MS";

/// Environment variable toggling the background notifier.
pub const NOTIFIER_ENV: &str = "STALECACHE_NOTIFIER";

/// Configuration for a [`Cache`](crate::Cache).
///
/// # Example
///
/// ```
/// use stalecache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_ttl(Duration::from_secs(30))
///     .with_name("sessions");
///
/// assert_eq!(config.ttl(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of every entry and period of the notifier (zero = never expire)
    pub ttl: Duration,

    /// Whether to start the background notifier when `ttl` is non-zero
    pub notifier: bool,

    /// Label attached to the notifier's log events
    pub name: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl CacheConfig {
    /// Creates a configuration with the given TTL and the notifier enabled.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notifier: true,
            name: None,
        }
    }

    /// Creates a configuration from a signed millisecond count.
    ///
    /// Zero or negative values mean "no expiration".
    pub fn from_millis(ttl_ms: i64) -> Self {
        Self::new(Duration::from_millis(ttl_ms.max(0) as u64))
    }

    /// Reads the configuration from `STALECACHE_TTL_MS` and `STALECACHE_NOTIFIER`.
    ///
    /// Missing variables keep their defaults. Unparsable values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::from_millis(0);

        if let Some(raw) = lookup(TTL_ENV) {
            match raw.trim().parse::<i64>() {
                Ok(ms) => config = Self::from_millis(ms),
                Err(e) => warn!(var = TTL_ENV, value = %raw, error = %e, "Ignoring invalid TTL"),
            }
        }

        if let Some(raw) = lookup(NOTIFIER_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" | "no" => config.notifier = false,
                "1" | "true" | "on" | "yes" => config.notifier = true,
                _ => warn!(var = NOTIFIER_ENV, value = %raw, "Ignoring invalid notifier flag"),
            }
        }

        config
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enables or disables the background notifier.
    ///
    /// With the notifier disabled, entries still expire but no callback is
    /// ever invoked.
    pub fn with_notifier(mut self, enabled: bool) -> Self {
        self.notifier = enabled;
        self
    }

    /// Sets the name used in log events.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the normalized TTL: `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        (!self.ttl.is_zero()).then_some(self.ttl)
    }

    /// Returns the notifier period, or `None` if no notifier should run.
    pub(crate) fn notifier_interval(&self) -> Option<Duration> {
        self.ttl().filter(|_| self.notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        let config = CacheConfig::new(Duration::ZERO);
        assert_eq!(config.ttl(), None);
        assert_eq!(config.notifier_interval(), None);
    }

    #[test]
    fn test_negative_millis_normalized() {
        let config = CacheConfig::from_millis(-250);
        assert_eq!(config.ttl(), None);
        assert!(config.notifier);

        let config = CacheConfig::from_millis(250);
        assert_eq!(config.ttl(), Some(Duration::from_millis(250)));
        assert_eq!(config.notifier_interval(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_notifier_can_be_disabled() {
        let config = CacheConfig::new(Duration::from_secs(1)).with_notifier(false);
        assert_eq!(config.ttl(), Some(Duration::from_secs(1)));
        assert_eq!(config.notifier_interval(), None);
    }

    #[test]
    fn test_from_lookup() {
        let config = CacheConfig::from_lookup(lookup(&[(TTL_ENV, "1500"), (NOTIFIER_ENV, "off")]));
        assert_eq!(config.ttl(), Some(Duration::from_millis(1500)));
        assert!(!config.notifier);

        let config = CacheConfig::from_lookup(lookup(&[]));
        assert_eq!(config.ttl(), None);
        assert!(config.notifier);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config =
            CacheConfig::from_lookup(lookup(&[(TTL_ENV, "soon"), (NOTIFIER_ENV, "maybe")]));
        assert_eq!(config.ttl(), None);
        assert!(config.notifier);
    }
}
