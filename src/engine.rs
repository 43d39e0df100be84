//! Wires the coordinators together from an [`AppConfig`].

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::audit::AuditCoordinator;
use crate::cache::StatusCache;
use crate::config::AppConfig;
use crate::impact::ImpactSettings;
use crate::prober::{HttpFetcher, PageFetcher, Prober, ProviderFetcher};
use crate::search::ReplacementSearcher;
use crate::suggest::SuggestionCoordinator;
use crate::url_parser::UrlClassifier;

/// Everything a front end needs to audit links and suggest replacements
#[derive(Clone)]
pub struct Engine {
    pub auditor: Arc<AuditCoordinator>,
    pub suggester: Arc<SuggestionCoordinator>,
    pub impact: ImpactSettings,
}

impl Engine {
    /// Builds the engine on a real HTTP client. Searches go through the
    /// scraping provider when one is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = Arc::new(HttpFetcher::new(config.probe.probe_config())?);

        let search_fetcher: Arc<dyn PageFetcher> = if config.provider.is_configured() {
            info!("Routing searches through provider {}", config.provider.endpoint);
            Arc::new(ProviderFetcher::new(http.clone(), config.provider.clone()))
        } else {
            http.clone()
        };

        Ok(Self::with_fetchers(http, search_fetcher, config))
    }

    /// Builds the engine on caller-supplied transports.
    pub fn with_fetchers(probe_fetcher: Arc<dyn PageFetcher>, search_fetcher: Arc<dyn PageFetcher>, config: &AppConfig) -> Self {
        let prober = Prober::new(
            probe_fetcher,
            UrlClassifier::new(config.marketplace.clone()),
            config.signals.clone(),
            StatusCache::new(config.cache.ttl()),
            config.probe.probe_config().request_timeout,
        );
        let auditor = AuditCoordinator::new(Arc::new(prober), config.audit.clone());

        let searcher = ReplacementSearcher::new(search_fetcher, config.search.clone()).with_signals(config.signals.clone());
        let suggester = SuggestionCoordinator::new(
            Arc::new(searcher),
            Arc::new(config.suggest.rate_limiter()),
            config.suggest.clone(),
        );

        Self {
            auditor: Arc::new(auditor),
            suggester: Arc::new(suggester),
            impact: config.impact.clone(),
        }
    }
}
