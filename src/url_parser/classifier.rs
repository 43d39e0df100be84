use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::patterns::extract_product_id;
use super::url_validator::{bare_host, normalize_url};
use crate::models::Merchant;

/// What kind of link a URL is, judged from its host and path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Marketplace page with an extractable product id
    MarketplaceProduct,
    /// Marketplace short-link that must be resolved to learn the product
    MarketplaceShortLink,
    /// Marketplace page without a product id (storefront, list, search)
    MarketplacePage,
    UnknownMerchant,
}

impl LinkKind {
    pub fn merchant(&self) -> Merchant {
        match self {
            LinkKind::MarketplaceProduct | LinkKind::MarketplaceShortLink | LinkKind::MarketplacePage => {
                Merchant::Marketplace
            }
            LinkKind::UnknownMerchant => Merchant::Unknown,
        }
    }
}

/// Marketplace host families and tag parameter names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    pub product_hosts: Vec<String>,
    pub short_link_hosts: Vec<String>,
    pub tag_params: Vec<String>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        let product_hosts = [
            "amazon.com", "amazon.ca", "amazon.com.mx", "amazon.com.br", "amazon.co.uk",
            "amazon.de", "amazon.fr", "amazon.it", "amazon.es", "amazon.nl", "amazon.se",
            "amazon.pl", "amazon.in", "amazon.co.jp", "amazon.com.au", "amazon.sg", "amazon.ae",
        ];
        let short_link_hosts = ["amzn.to", "a.co", "amzn.eu", "amzn.asia"];

        Self {
            product_hosts: product_hosts.iter().map(|h| h.to_string()).collect(),
            short_link_hosts: short_link_hosts.iter().map(|h| h.to_string()).collect(),
            tag_params: vec!["tag".to_string()],
        }
    }
}

fn host_matches(host: &str, family: &[String]) -> bool {
    family
        .iter()
        .any(|candidate| host == candidate || host.ends_with(&format!(".{}", candidate)))
}

/// A URL with its kind and identifying tokens
#[derive(Debug, Clone)]
pub struct ClassifiedUrl {
    pub original: String,
    pub normalized: Url,
    pub kind: LinkKind,
    pub product_id: Option<String>,
    pub affiliate_tag: Option<String>,
}

impl ClassifiedUrl {
    /// Product id when known, otherwise the normalized URL. Two tags pointing
    /// at the same product share one key.
    pub fn cache_key(&self) -> String {
        match &self.product_id {
            Some(id) => id.clone(),
            None => self.normalized.to_string(),
        }
    }

    pub fn merchant(&self) -> Merchant {
        self.kind.merchant()
    }
}

/// Pure URL classifier; performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct UrlClassifier {
    config: MarketplaceConfig,
}

impl UrlClassifier {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn classify(&self, url: &str) -> Result<ClassifiedUrl> {
        let normalized = normalize_url(url).with_context(|| format!("Cannot classify URL: {}", url))?;
        let host = bare_host(&normalized);

        let kind = if host_matches(&host, &self.config.short_link_hosts) {
            LinkKind::MarketplaceShortLink
        } else if host_matches(&host, &self.config.product_hosts) {
            LinkKind::MarketplacePage
        } else {
            LinkKind::UnknownMerchant
        };

        let product_id = match kind {
            LinkKind::MarketplacePage | LinkKind::MarketplaceProduct => extract_product_id(normalized.path()),
            LinkKind::MarketplaceShortLink | LinkKind::UnknownMerchant => None,
        };
        let kind = if product_id.is_some() {
            LinkKind::MarketplaceProduct
        } else {
            kind
        };

        let affiliate_tag = self.affiliate_tag(&normalized);
        trace!(
            "Classified {} as {:?} (product_id={:?}, tag={:?})",
            url,
            kind,
            product_id,
            affiliate_tag
        );

        Ok(ClassifiedUrl {
            original: url.to_string(),
            normalized,
            kind,
            product_id,
            affiliate_tag,
        })
    }

    /// Product id of an already-resolved URL, if it is a marketplace product page.
    pub fn product_id_of(&self, url: &Url) -> Option<String> {
        if host_matches(&bare_host(url), &self.config.product_hosts) {
            extract_product_id(url.path())
        } else {
            None
        }
    }

    /// First non-empty tag parameter carried by the URL.
    pub fn affiliate_tag(&self, url: &Url) -> Option<String> {
        let tag = url.query_pairs().find_map(|(key, value)| {
            let key = key.to_ascii_lowercase();
            if self.config.tag_params.iter().any(|p| *p == key) && !value.trim().is_empty() {
                Some(value.into_owned())
            } else {
                None
            }
        });
        if tag.is_none() {
            debug!("No affiliate tag on {}", url);
        }
        tag
    }
}
