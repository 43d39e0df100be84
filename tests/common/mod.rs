#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use link_audit::cache::StatusCache;
use link_audit::error::FetchError;
use link_audit::prober::{FetchedPage, PageFetcher, PageSignals, Prober};
use link_audit::url_parser::{MarketplaceConfig, UrlClassifier};

pub const IN_STOCK_PAGE: &str = r#"<html><span id="productTitle">Logitech M185 Wireless Mouse</span>
<div id="availability">In Stock</div><input id="add-to-cart-button" type="submit"></html>"#;

#[derive(Debug, Clone)]
pub enum FakeRoute {
    Page { final_url: Option<String>, status: u16, body: String },
    Hang,
    Fail,
}

impl FakeRoute {
    pub fn ok(body: &str) -> Self {
        FakeRoute::Page {
            final_url: None,
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        FakeRoute::Page {
            final_url: None,
            status,
            body: String::new(),
        }
    }
}

/// In-memory transport that records how it was used
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, FakeRoute>,
    fallback: Option<FakeRoute>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, route: FakeRoute) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub fn fallback(mut self, route: FakeRoute) -> Self {
        self.fallback = Some(route);
        self
    }

    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.get(url).or(self.fallback.as_ref()).cloned();
        let result = match route {
            Some(FakeRoute::Page { final_url, status, body }) => Ok(FetchedPage {
                requested_url: url.to_string(),
                final_url: final_url.unwrap_or_else(|| url.to_string()),
                status,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body,
            }),
            Some(FakeRoute::Hang) => std::future::pending().await,
            Some(FakeRoute::Fail) | None => Err(FetchError::Network(format!("connection refused: {}", url))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn prober_with(fetcher: Arc<FakeFetcher>, request_timeout: Duration) -> Prober {
    Prober::new(
        fetcher,
        UrlClassifier::default(),
        PageSignals::default(),
        StatusCache::default(),
        request_timeout,
    )
}

/// Classifier that treats the loopback host as the marketplace
pub fn loopback_classifier() -> UrlClassifier {
    UrlClassifier::new(MarketplaceConfig {
        product_hosts: vec!["127.0.0.1".to_string()],
        ..MarketplaceConfig::default()
    })
}

pub fn search_listing(asin: &str, title: &str) -> String {
    format!(
        r#"<div data-asin="{asin}" data-component-type="s-search-result" class="s-result-item"><img class="s-image" src="https://m.media-amazon.com/images/I/{asin}.jpg" alt="{title}"><h2 aria-label="{title}"><a><span>{title}</span></a></h2><span class="a-price"><span class="a-offscreen">$24.99</span></span></div>"#
    )
}

pub fn search_page(listings: &[(&str, &str)]) -> String {
    let body: String = listings.iter().map(|(asin, title)| search_listing(asin, title)).collect();
    format!("<html><body>{}</body></html>", body)
}
