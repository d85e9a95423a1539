use serde::Deserialize;

/// Smallest allowed batch size.
pub const MIN_REQUEST_QUEUE: usize = 1;

/// Largest allowed batch size.
pub const MAX_REQUEST_QUEUE: usize = 200;

/// Shortest allowed inter-batch interval in seconds.
pub const MIN_QUEUE_INTERVAL_SECS: f32 = 0.1;

/// Longest allowed inter-batch interval in seconds.
pub const MAX_QUEUE_INTERVAL_SECS: f32 = 50.0;

/// Smallest allowed per-descriptor attempt cap.
pub const MIN_QUEUE_ATTEMPTS: u32 = 1;

/// Largest allowed per-descriptor attempt cap.
pub const MAX_QUEUE_ATTEMPTS: u32 = 200;

/// Top-level configuration for the fetch engine.
///
/// Immutable for a given engine instance once constructed; `clamped()`
/// normalizes out-of-range values instead of rejecting them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Log every attempt's outcome at debug level.
    pub debug_mode: bool,
    /// Validity window of cached text responses, in seconds.
    pub cache_lifetime: u64,
    /// Persist the queue after each dispatched batch and reload it at startup.
    pub save_queue_between_sessions: bool,
    /// Maximum number of descriptors dispatched per batch.
    pub max_request_queue: usize,
    /// Cooperative sleep between batches, in seconds.
    pub queue_requests_interval: f32,
    /// Attempts before the queue gives up on a descriptor.
    pub queue_max_attempts: u32,
    /// When a valid cache hit is served, still refresh from the network.
    ///
    /// `true` reproduces the historical behavior where both a cached
    /// `on_complete` and a fresh network `on_complete` may fire for the same
    /// attempt; `false` short-circuits the network call on a hit.
    pub refresh_cached_requests: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            debug_mode: true,
            cache_lifetime: 600,
            save_queue_between_sessions: true,
            max_request_queue: 10,
            queue_requests_interval: 5.0,
            queue_max_attempts: 3,
            refresh_cached_requests: true,
        }
    }
}

impl NetConfig {
    /// Parse a configuration from JSON, falling back to defaults for
    /// missing fields, then clamp ranges.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: NetConfig = serde_json::from_str(text)?;
        Ok(config.clamped())
    }

    /// Normalize all tunables into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.max_request_queue = self
            .max_request_queue
            .clamp(MIN_REQUEST_QUEUE, MAX_REQUEST_QUEUE);
        self.queue_requests_interval = self
            .queue_requests_interval
            .clamp(MIN_QUEUE_INTERVAL_SECS, MAX_QUEUE_INTERVAL_SECS);
        self.queue_max_attempts = self
            .queue_max_attempts
            .clamp(MIN_QUEUE_ATTEMPTS, MAX_QUEUE_ATTEMPTS);
        self
    }
}
