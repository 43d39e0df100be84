use std::time::Duration;

// Constants for probe configuration
const MAX_REDIRECTS: usize = 10;
const REQUEST_TIMEOUT: u64 = 20; // seconds
const CONNECTION_TIMEOUT: u64 = 10; // seconds
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Desktop browser user agents rotated per request
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Configuration for the HTTP side of a probe
///
/// Every request carries a finite timeout; a timeout is reported like any
/// other fetch failure.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub max_redirects: usize,
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub max_body_bytes: usize,
    pub user_agents: Vec<String>,
    pub accept_language: String,
}

impl ProbeConfig {
    /// Creates a new probe configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of redirects to follow
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connection timeout for establishing new connections
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the cap on how much of a response body is read
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Replaces the rotated user agents
    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }

    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_redirects: MAX_REDIRECTS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT),
            connection_timeout: Duration::from_secs(CONNECTION_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            max_body_bytes: MAX_BODY_BYTES,
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}
