use std::time::Duration;

use crate::config::ServerSettings;

/// Default capacity for the suggestion job queue
pub const QUEUE_SIZE: usize = 100;

/// Suggestions are rate limited upstream, so one worker drains the queue.
pub const SUGGEST_WORKERS: usize = 1;

/// Upper bound on URLs accepted by a single audit request
pub const MAX_AUDIT_BATCH: usize = 500;

/// Configuration for the API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Capacity of the suggestion job queue
    pub queue_size: usize,

    /// Number of suggestion workers
    pub workers: usize,

    /// How long a handler waits for a queued job
    pub request_timeout: Duration,

    pub max_audit_batch: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            queue_size: QUEUE_SIZE,
            workers: SUGGEST_WORKERS,
            request_timeout: Duration::from_secs(120),
            max_audit_batch: MAX_AUDIT_BATCH,
        }
    }
}

impl From<&ServerSettings> for ApiConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            queue_size: settings.queue_size.max(1),
            request_timeout: settings.request_timeout(),
            ..Self::default()
        }
    }
}
