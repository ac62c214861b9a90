use chrono::Duration;

use crate::config::CacheConfig;

/// Decides how long an entry may be served.
pub trait VolatilityPolicy: Send + Sync {
    /// Lifetime of the entry stored under `key`. `None` keeps it until the
    /// cache is cleared.
    fn lifetime(&self, key: &str) -> Option<Duration>;
}

/// Keys containing any marker are volatile and expire after `lifetime`;
/// every other key is kept.
#[derive(Debug, Clone)]
pub struct MarkerPolicy {
    markers: Vec<String>,
    lifetime: Duration,
}

impl MarkerPolicy {
    pub fn new(markers: Vec<String>, lifetime: Duration) -> Self {
        Self { markers, lifetime }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let secs = i64::try_from(config.volatile_ttl_secs).unwrap_or(i64::MAX);
        Self::new(
            config.volatile_markers.clone(),
            Duration::try_seconds(secs).unwrap_or(Duration::MAX),
        )
    }

    pub fn is_volatile(&self, key: &str) -> bool {
        self.markers.iter().any(|m| key.contains(m.as_str()))
    }
}

impl VolatilityPolicy for MarkerPolicy {
    fn lifetime(&self, key: &str) -> Option<Duration> {
        self.is_volatile(key).then_some(self.lifetime)
    }
}
