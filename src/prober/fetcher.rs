use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

use super::config::ProbeConfig;
use crate::error::FetchError;

/// Response of a single GET after redirects were followed
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    /// Responses without a content type are given the benefit of the doubt.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            }
            None => true,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by the prober and the searcher.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url).await
    }
}

/// Direct HTTP fetcher backed by a pooled reqwest client
pub struct HttpFetcher {
    client: Client,
    config: ProbeConfig,
}

impl HttpFetcher {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).context("Invalid Accept-Language header")?,
        );

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    fn pick_user_agent(&self) -> &str {
        self.config
            .user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or("Mozilla/5.0")
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut resp = self
            .client
            .get(url)
            .header(USER_AGENT, self.pick_user_agent())
            .send()
            .await?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        debug!("GET {} -> {} ({})", url, status, final_url);

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            let remaining = self.config.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                trace!("Body of {} truncated at {} bytes", url, self.config.max_body_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            status,
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Third-party scraping provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider endpoint, e.g. `https://api.scraperapi.com/`
    pub endpoint: String,
    pub api_key: String,
    /// Extra query parameters passed through to the provider
    pub params: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty()
    }
}

/// Routes requests through a scraping provider.
///
/// The provider hides the redirect chain, so the reported final URL is the
/// target URL. Throttling and provider-side failures surface as errors,
/// never as a successful page.
pub struct ProviderFetcher<F> {
    inner: F,
    config: ProviderConfig,
}

impl<F: PageFetcher> ProviderFetcher<F> {
    pub fn new(inner: F, config: ProviderConfig) -> Self {
        Self { inner, config }
    }

    pub fn provider_url(&self, target: &str) -> Result<String, FetchError> {
        let mut url = url::Url::parse(&self.config.endpoint)
            .map_err(|e| FetchError::InvalidUrl(format!("provider endpoint {}: {}", self.config.endpoint, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.config.api_key);
            pairs.append_pair("url", target);
            for (key, value) in &self.config.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for ProviderFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let provider_url = self.provider_url(url)?;
        let page = self.inner.fetch(&provider_url).await?;

        match page.status {
            429 => {
                warn!("Scraping provider throttled request for {}", url);
                Err(FetchError::RateLimited { status: 429 })
            }
            401 | 403 => Err(FetchError::Provider {
                status: page.status,
                message: "provider rejected credentials".to_string(),
            }),
            status if status >= 500 => Err(FetchError::Provider {
                status,
                message: page.body.chars().take(200).collect(),
            }),
            _ => Ok(FetchedPage {
                requested_url: url.to_string(),
                final_url: url.to_string(),
                ..page
            }),
        }
    }
}
