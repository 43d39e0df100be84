use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::scoring::ConfidenceLevel;

/// Health state of a single affiliate link after one probe.
///
/// The set is closed: there is no catch-all variant, and every consumer is
/// expected to match on all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Ok,
    OutOfStock,
    OutOfStockThirdParty,
    NotFound,
    SearchRedirect,
    MissingTag,
    Redirect,
    Unknown,
}

impl LinkStatus {
    pub const ALL: [LinkStatus; 8] = [
        LinkStatus::Ok,
        LinkStatus::OutOfStock,
        LinkStatus::OutOfStockThirdParty,
        LinkStatus::NotFound,
        LinkStatus::SearchRedirect,
        LinkStatus::MissingTag,
        LinkStatus::Redirect,
        LinkStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Ok => "OK",
            LinkStatus::OutOfStock => "OUT_OF_STOCK",
            LinkStatus::OutOfStockThirdParty => "OUT_OF_STOCK_THIRD_PARTY",
            LinkStatus::NotFound => "NOT_FOUND",
            LinkStatus::SearchRedirect => "SEARCH_REDIRECT",
            LinkStatus::MissingTag => "MISSING_TAG",
            LinkStatus::Redirect => "REDIRECT",
            LinkStatus::Unknown => "UNKNOWN",
        }
    }

    /// Whether the link has stopped earning and is a candidate for a replacement.
    pub fn is_broken(&self) -> bool {
        match self {
            LinkStatus::NotFound
            | LinkStatus::SearchRedirect
            | LinkStatus::OutOfStock
            | LinkStatus::OutOfStockThirdParty => true,
            LinkStatus::Ok | LinkStatus::MissingTag | LinkStatus::Redirect | LinkStatus::Unknown => {
                false
            }
        }
    }

    /// Unknown results are never cached so the next run retries them.
    pub fn is_cacheable(&self) -> bool {
        match self {
            LinkStatus::Unknown => false,
            LinkStatus::Ok
            | LinkStatus::OutOfStock
            | LinkStatus::OutOfStockThirdParty
            | LinkStatus::NotFound
            | LinkStatus::SearchRedirect
            | LinkStatus::MissingTag
            | LinkStatus::Redirect => true,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merchant family a link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Merchant {
    Marketplace,
    Unknown,
}

/// Classification of one audited URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub url: String,
    pub product_id: Option<String>,
    pub merchant: Merchant,
    pub status: LinkStatus,
    pub http_code: Option<u16>,
    pub last_checked_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Record for a URL that could not be classified at all.
    pub fn unknown(url: &str) -> Self {
        Self {
            url: url.to_string(),
            product_id: None,
            merchant: Merchant::Unknown,
            status: LinkStatus::Unknown,
            http_code: None,
            last_checked_at: Utc::now(),
        }
    }
}

/// A product listing extracted from a marketplace search results page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub title: String,
    pub product_id: String,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub confidence_score: u8,
}

/// Context the broken link appeared in, used to build the replacement query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContext {
    pub video_title: String,
    #[serde(default)]
    pub video_description_excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub original_url: String,
    pub search_context: SearchContext,
    pub affiliate_tag: String,
    /// Product ids already offered and rejected for this link.
    #[serde(default)]
    pub exclude_product_ids: HashSet<String>,
}

/// Result of one replacement search. Failures are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionOutcome {
    pub success: bool,
    pub best_match: Option<Candidate>,
    pub search_query: String,
    pub suggested_url: Option<String>,
    /// Display band of the best match's score: high from 85, medium from 70.
    #[serde(default)]
    pub confidence_level: Option<ConfidenceLevel>,
    pub error: Option<String>,
    /// True when a later attempt may succeed (network trouble, throttling).
    #[serde(default)]
    pub retryable: bool,
}

impl SuggestionOutcome {
    pub fn found(search_query: String, best_match: Candidate, suggested_url: String) -> Self {
        Self {
            success: true,
            confidence_level: Some(ConfidenceLevel::from_score(best_match.confidence_score)),
            best_match: Some(best_match),
            search_query,
            suggested_url: Some(suggested_url),
            error: None,
            retryable: false,
        }
    }

    pub fn failed(search_query: String, error: String, retryable: bool) -> Self {
        Self {
            success: false,
            best_match: None,
            search_query,
            suggested_url: None,
            confidence_level: None,
            error: Some(error),
            retryable,
        }
    }
}
