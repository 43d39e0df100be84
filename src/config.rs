//! Application configuration.
//!
//! Layered as built-in defaults, then an optional TOML file, then
//! `LINK_AUDIT__SECTION__KEY` environment variables.

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audit::AuditConfig;
use crate::impact::ImpactSettings;
use crate::prober::{PageSignals, ProbeConfig, ProviderConfig};
use crate::search::SearchConfig;
use crate::suggest::SuggestConfig;
use crate::url_parser::MarketplaceConfig;

pub const ENV_PREFIX: &str = "LINK_AUDIT";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Suggestion jobs that may wait for the worker
    pub queue_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            queue_size: 100,
            request_timeout_secs: 120,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// File form of [`ProbeConfig`]. An empty `user_agents` keeps the built-in list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub max_redirects: usize,
    pub request_timeout_secs: u64,
    pub connection_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub user_agents: Vec<String>,
    pub accept_language: Option<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        let defaults = ProbeConfig::default();
        Self {
            max_redirects: defaults.max_redirects,
            request_timeout_secs: defaults.request_timeout.as_secs(),
            connection_timeout_secs: defaults.connection_timeout.as_secs(),
            max_body_bytes: defaults.max_body_bytes,
            user_agents: Vec::new(),
            accept_language: None,
        }
    }
}

impl ProbeSettings {
    pub fn probe_config(&self) -> ProbeConfig {
        let mut config = ProbeConfig::new()
            .with_max_redirects(self.max_redirects)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs.max(1)))
            .with_connection_timeout(Duration::from_secs(self.connection_timeout_secs.max(1)))
            .with_max_body_bytes(self.max_body_bytes);
        if !self.user_agents.is_empty() {
            config = config.with_user_agents(self.user_agents.clone());
        }
        if let Some(lang) = &self.accept_language {
            config = config.with_accept_language(lang.clone());
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: crate::cache::DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_dir: String,
    pub server: ServerSettings,
    pub probe: ProbeSettings,
    pub marketplace: MarketplaceConfig,
    pub signals: PageSignals,
    pub cache: CacheSettings,
    pub audit: AuditConfig,
    pub search: SearchConfig,
    pub provider: ProviderConfig,
    pub suggest: SuggestConfig,
    pub impact: ImpactSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            server: ServerSettings::default(),
            probe: ProbeSettings::default(),
            marketplace: MarketplaceConfig::default(),
            signals: PageSignals::default(),
            cache: CacheSettings::default(),
            audit: AuditConfig::default(),
            search: SearchConfig::default(),
            provider: ProviderConfig::default(),
            suggest: SuggestConfig::default(),
            impact: ImpactSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from an optional file plus the environment.
    /// A missing file is an error only when a path was given explicitly.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        match path {
            Some(path) => builder = builder.add_source(File::with_name(path)),
            None => builder = builder.add_source(File::with_name("link_audit").required(false)),
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration")?;
        config.try_deserialize().context("Failed to parse configuration")
    }
}
