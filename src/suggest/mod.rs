//! Replacement suggestions for broken links.

pub mod query;
pub mod rate_limiter;

pub use query::derive_search_query;
pub use rate_limiter::TokenBucket;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::SuggestionError;
use crate::models::{Candidate, SuggestionOutcome, SuggestionRequest};
use crate::scoring::score_candidates;
use crate::search::ReplacementSearcher;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Scores below this are not offered to the user
    pub min_confidence: u8,
    /// Searches allowed back to back before the limiter kicks in
    pub burst: u32,
    /// Time to earn back one search
    pub refill_interval_ms: u64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            min_confidence: 70,
            burst: 1,
            refill_interval_ms: 1000,
        }
    }
}

impl SuggestConfig {
    pub fn rate_limiter(&self) -> TokenBucket {
        TokenBucket::new(self.burst, Duration::from_millis(self.refill_interval_ms))
    }
}

/// Picks the best-scoring candidate that is not excluded. Earlier listings
/// win ties. Scores are written back onto the candidates.
pub fn select_best(
    candidates: Vec<Candidate>,
    query: &str,
    exclude: &HashSet<String>,
    min_confidence: u8,
) -> Result<Candidate, SuggestionError> {
    let mut remaining: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !exclude.contains(&c.product_id))
        .collect();
    score_candidates(&mut remaining, query);

    let best = remaining
        .into_iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.confidence_score.cmp(&b.confidence_score).then(ib.cmp(ia)))
        .map(|(_, c)| c)
        .ok_or_else(|| SuggestionError::NoCandidateFound {
            query: query.to_string(),
        })?;

    if best.confidence_score < min_confidence {
        return Err(SuggestionError::BelowThreshold {
            score: best.confidence_score,
            minimum: min_confidence,
        });
    }
    Ok(best)
}

pub struct SuggestionCoordinator {
    searcher: Arc<ReplacementSearcher>,
    limiter: Arc<TokenBucket>,
    config: SuggestConfig,
}

impl SuggestionCoordinator {
    pub fn new(searcher: Arc<ReplacementSearcher>, limiter: Arc<TokenBucket>, config: SuggestConfig) -> Self {
        Self {
            searcher,
            limiter,
            config,
        }
    }

    /// Finds a replacement for one broken link. Failures come back as an
    /// unsuccessful outcome carrying the reason; the suggested URL is only
    /// ever built from a product id parsed out of a search result.
    #[instrument(level = "info", skip_all, fields(url = %request.original_url))]
    pub async fn find_replacement(&self, request: &SuggestionRequest) -> SuggestionOutcome {
        let Some(query) = derive_search_query(&request.search_context, &request.original_url) else {
            let err = SuggestionError::EmptyContext;
            return SuggestionOutcome::failed(String::new(), err.to_string(), err.is_retryable());
        };

        match self.suggest(request, &query).await {
            Ok((best, url)) => {
                info!("Suggesting {} ({}) for {:?}", best.product_id, best.confidence_score, query);
                SuggestionOutcome::found(query, best, url)
            }
            Err(e) => {
                warn!("No suggestion for {:?}: {}", query, e);
                SuggestionOutcome::failed(query, e.to_string(), e.is_retryable())
            }
        }
    }

    async fn suggest(&self, request: &SuggestionRequest, query: &str) -> Result<(Candidate, String), SuggestionError> {
        let tag = request.affiliate_tag.trim();
        if tag.is_empty() {
            return Err(SuggestionError::MissingAffiliateTag);
        }

        self.limiter.acquire().await;
        let candidates = self.searcher.search(query).await?;
        let best = select_best(candidates, query, &request.exclude_product_ids, self.config.min_confidence)?;
        let url = self.searcher.config().product_url(&best.product_id, tag);
        Ok((best, url))
    }

    /// Runs requests one after another, each waiting on the shared limiter.
    pub async fn find_replacements(&self, requests: &[SuggestionRequest]) -> Vec<SuggestionOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            outcomes.push(self.find_replacement(request).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, title: &str) -> Candidate {
        Candidate {
            title: title.to_string(),
            product_id: id.to_string(),
            price: None,
            image_url: None,
            confidence_score: 0,
        }
    }

    #[test]
    fn test_select_best_prefers_highest_score() {
        let candidates = vec![
            candidate("B000000001", "Desk Lamp"),
            candidate("B000000002", "Logitech M185 Wireless Mouse"),
        ];
        let best = select_best(candidates, "Logitech Wireless Mouse", &HashSet::new(), 70).unwrap();
        assert_eq!(best.product_id, "B000000002");
        assert!(best.confidence_score >= 85);
    }

    #[test]
    fn test_select_best_skips_excluded() {
        let candidates = vec![
            candidate("B000000001", "Anker Charger"),
            candidate("B000000002", "Anker Charger"),
            candidate("B000000003", "Anker Charger"),
        ];
        let exclude: HashSet<String> = ["B000000001".to_string()].into();
        let best = select_best(candidates, "Anker Charger", &exclude, 0).unwrap();
        assert_eq!(best.product_id, "B000000002");
    }

    #[test]
    fn test_select_best_all_excluded() {
        let candidates = vec![candidate("B000000001", "Anker Charger")];
        let exclude: HashSet<String> = ["B000000001".to_string()].into();
        let err = select_best(candidates, "Anker Charger", &exclude, 70).unwrap_err();
        assert!(matches!(err, SuggestionError::NoCandidateFound { .. }));
        assert_eq!(err.to_string(), "no reliable replacement found for \"Anker Charger\"");
    }

    #[test]
    fn test_select_best_applies_threshold() {
        let candidates = vec![candidate("B000000001", "Anker Charger")];
        let err = select_best(candidates, "Anker Charger", &HashSet::new(), 101).unwrap_err();
        assert!(matches!(err, SuggestionError::BelowThreshold { minimum: 101, .. }));
    }
}
