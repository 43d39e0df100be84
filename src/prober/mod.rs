//! Single-URL health probe: classify, consult the cache, fetch, decide, cache.

pub mod classify;
pub mod config;
pub mod fetcher;
pub mod signals;

pub use classify::{classify_page, PageVerdict, TagEvidence};
pub use config::ProbeConfig;
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher, ProviderConfig, ProviderFetcher};
pub use signals::PageSignals;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheEntry, StatusCache};
use crate::error::FetchError;
use crate::models::{LinkRecord, LinkStatus, Merchant};
use crate::url_parser::UrlClassifier;

/// Slack on top of the transport timeout, for fetchers that do not enforce one.
const TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// A probe result plus whether it was served from cache
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub record: LinkRecord,
    pub from_cache: bool,
}

pub struct Prober {
    fetcher: Arc<dyn PageFetcher>,
    classifier: UrlClassifier,
    signals: PageSignals,
    cache: StatusCache,
    request_timeout: Duration,
}

impl Prober {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: UrlClassifier,
        signals: PageSignals,
        cache: StatusCache,
        request_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            signals,
            cache,
            request_timeout,
        }
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    /// Probes one URL. Never fails: anything that prevents a confident
    /// classification yields an `UNKNOWN` record, which is not cached.
    #[instrument(level = "debug", skip(self))]
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let target = match self.classifier.classify(url) {
            Ok(target) => target,
            Err(e) => {
                warn!("Cannot probe malformed URL {}: {:#}", url, e);
                return ProbeOutcome {
                    record: LinkRecord::unknown(url),
                    from_cache: false,
                };
            }
        };
        let merchant = target.merchant();
        let key = target.cache_key();
        let source_url = target.normalized.to_string();

        if let Some(entry) = self.cache.get(&key).await {
            let status = entry.status_for(&source_url, target.affiliate_tag.is_some());
            debug!("Serving {} from cache ({}, cached as {})", url, status, entry.status);
            return ProbeOutcome {
                record: LinkRecord {
                    url: url.to_string(),
                    product_id: target.product_id.clone().or(entry.product_id),
                    merchant,
                    status,
                    http_code: entry.http_code,
                    last_checked_at: entry.cached_at,
                },
                from_cache: true,
            };
        }

        let fetched = match timeout(self.request_timeout + TIMEOUT_GRACE, self.fetcher.fetch(url.trim())).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                return ProbeOutcome {
                    record: LinkRecord {
                        url: url.to_string(),
                        product_id: target.product_id.clone(),
                        merchant,
                        status: LinkStatus::Unknown,
                        http_code: None,
                        last_checked_at: Utc::now(),
                    },
                    from_cache: false,
                };
            }
        };

        let verdict = classify_page(&target, &page, &self.classifier, &self.signals);
        let product_id = target.product_id.clone().or(verdict.resolved_product_id.clone());
        let status = verdict.link_status();
        info!("{} -> {} (http {:?})", url, status, verdict.http_code);

        let record = LinkRecord {
            url: url.to_string(),
            product_id: product_id.clone(),
            merchant: if product_id.is_some() { Merchant::Marketplace } else { merchant },
            status,
            http_code: verdict.http_code,
            last_checked_at: Utc::now(),
        };

        // The product's availability is shared; the tag check is redone per URL on read.
        if verdict.status.is_cacheable() {
            let entry = CacheEntry::new(key.clone(), verdict.status, record.http_code)
                .with_product_id(product_id)
                .with_source(source_url, verdict.tag)
                .with_cached_at(record.last_checked_at);
            self.cache.put(&key, entry).await;
        }

        ProbeOutcome {
            record,
            from_cache: false,
        }
    }
}
