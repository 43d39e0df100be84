//! Marketplace search for replacement candidates.

pub mod listing;
pub mod strategies;

pub use listing::ListingExtractor;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::error::{FetchError, SearchError};
use crate::models::Candidate;
use crate::prober::{PageFetcher, PageSignals};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Scheme and host of the marketplace, e.g. `https://www.amazon.com`
    pub marketplace_base: String,
    pub max_results: usize,
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            marketplace_base: "https://www.amazon.com".to_string(),
            max_results: 10,
            request_timeout_secs: 60,
        }
    }
}

impl SearchConfig {
    pub fn with_marketplace_base(mut self, base: impl Into<String>) -> Self {
        self.marketplace_base = base.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/s?k={}",
            self.marketplace_base.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    /// Canonical product link for a product id, tagged for attribution.
    pub fn product_url(&self, product_id: &str, affiliate_tag: &str) -> String {
        format!(
            "{}/dp/{}?tag={}",
            self.marketplace_base.trim_end_matches('/'),
            product_id,
            urlencoding::encode(affiliate_tag)
        )
    }
}

pub struct ReplacementSearcher {
    fetcher: Arc<dyn PageFetcher>,
    config: SearchConfig,
    extractor: ListingExtractor,
    signals: PageSignals,
}

impl ReplacementSearcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: SearchConfig) -> Self {
        Self {
            fetcher,
            config,
            extractor: ListingExtractor::default(),
            signals: PageSignals::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: ListingExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_signals(mut self, signals: PageSignals) -> Self {
        self.signals = signals;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Organic listings for the query, in page order, capped at `max_results`.
    /// An empty list means the search worked and nothing usable was found.
    #[instrument(level = "debug", skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let url = self.config.search_url(query);
        let limit = Duration::from_secs(self.config.request_timeout_secs.max(1));
        let page = match timeout(limit, self.fetcher.fetch(&url)).await {
            Ok(result) => result?,
            Err(_) => return Err(SearchError::Fetch(FetchError::Timeout)),
        };

        if page.status == 429 {
            warn!("Search for {:?} was rate limited", query);
            return Err(SearchError::Fetch(FetchError::RateLimited { status: 429 }));
        }
        if !page.is_success() {
            return Err(SearchError::UpstreamStatus(page.status));
        }
        if self.signals.scan(&page.body).bot_check {
            warn!("Search for {:?} hit a bot check", query);
            return Err(SearchError::Blocked);
        }

        let mut candidates = self.extractor.extract(&page.body);
        candidates.truncate(self.config.max_results);
        info!("Search for {:?} produced {} candidates", query, candidates.len());
        Ok(candidates)
    }
}
