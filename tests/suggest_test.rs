mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use common::{search_page, FakeFetcher, FakeRoute};
use link_audit::scoring::ConfidenceLevel;
use link_audit::search::{ReplacementSearcher, SearchConfig};
use link_audit::suggest::{SuggestConfig, SuggestionCoordinator, TokenBucket};
use link_audit::{AppConfig, Engine, SearchContext, SuggestionRequest};

const MOUSE_A: &str = "B004YAVF8I";
const MOUSE_B: &str = "B07FKMDJQZ";

fn request(exclude: &[&str]) -> SuggestionRequest {
    SuggestionRequest {
        original_url: "https://amzn.to/3xYz9Q".to_string(),
        search_context: SearchContext {
            video_title: "Logitech Wireless Mouse".to_string(),
            video_description_excerpt: String::new(),
        },
        affiliate_tag: "creator-20".to_string(),
        exclude_product_ids: exclude.iter().map(|id| id.to_string()).collect::<HashSet<_>>(),
    }
}

fn engine_with_results(listings: &[(&str, &str)]) -> (Engine, Arc<FakeFetcher>) {
    let search = Arc::new(FakeFetcher::new().fallback(FakeRoute::ok(&search_page(listings))));
    let probe = Arc::new(FakeFetcher::new());
    let engine = Engine::with_fetchers(probe, search.clone(), &AppConfig::default());
    (engine, search)
}

#[tokio::test(start_paused = true)]
async fn test_refresh_returns_a_different_product() {
    let (engine, _) = engine_with_results(&[
        (MOUSE_A, "Logitech Wireless Mouse M185"),
        (MOUSE_B, "Logitech Wireless Mouse Pebble"),
    ]);

    let first = engine.suggester.find_replacement(&request(&[])).await;
    assert!(first.success, "{:?}", first.error);
    let first_id = first.best_match.as_ref().unwrap().product_id.clone();
    assert_eq!(first_id, MOUSE_A);
    assert_eq!(first.best_match.as_ref().unwrap().confidence_score, 100);
    assert_eq!(first.confidence_level, Some(ConfidenceLevel::High));
    assert_eq!(first.search_query, "Logitech Wireless Mouse");
    assert_eq!(
        first.suggested_url.as_deref(),
        Some("https://www.amazon.com/dp/B004YAVF8I?tag=creator-20")
    );

    let second = engine.suggester.find_replacement(&request(&[&first_id])).await;
    assert!(second.success);
    let second_id = second.best_match.unwrap().product_id;
    assert_ne!(second_id, first_id);
    assert_eq!(second_id, MOUSE_B);

    let third = engine.suggester.find_replacement(&request(&[&first_id, &second_id])).await;
    assert!(!third.success);
    assert!(third.best_match.is_none());
    assert!(third.suggested_url.is_none());
    assert_eq!(
        third.error.as_deref(),
        Some("no reliable replacement found for \"Logitech Wireless Mouse\"")
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_listings_is_a_structured_failure() {
    let (engine, _) = engine_with_results(&[]);
    let outcome = engine.suggester.find_replacement(&request(&[])).await;

    assert!(!outcome.success);
    assert!(!outcome.retryable);
    assert_eq!(outcome.search_query, "Logitech Wireless Mouse");
}

#[tokio::test(start_paused = true)]
async fn test_missing_tag_fails_without_searching() {
    let (engine, search) = engine_with_results(&[(MOUSE_A, "Logitech Wireless Mouse M185")]);
    let mut untagged = request(&[]);
    untagged.affiliate_tag = "  ".to_string();

    let outcome = engine.suggester.find_replacement(&untagged).await;
    assert!(!outcome.success);
    assert_eq!(search.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_search_failure_is_retryable() {
    let search = Arc::new(FakeFetcher::new().fallback(FakeRoute::status(503)));
    let searcher = ReplacementSearcher::new(search, SearchConfig::default());
    let coordinator = SuggestionCoordinator::new(
        Arc::new(searcher),
        Arc::new(TokenBucket::per_interval(Duration::from_secs(1))),
        SuggestConfig::default(),
    );

    let outcome = coordinator.find_replacement(&request(&[])).await;
    assert!(!outcome.success);
    assert!(outcome.retryable);
    assert!(outcome.error.unwrap().contains("503"));
}

#[tokio::test(start_paused = true)]
async fn test_batch_suggestions_are_rate_limited() {
    let (engine, search) = engine_with_results(&[(MOUSE_A, "Logitech Wireless Mouse M185")]);
    let requests = vec![request(&[]), request(&[]), request(&[])];

    let start = Instant::now();
    let outcomes = engine.suggester.find_replacements(&requests).await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.success));
    assert_eq!(search.calls(), 3);
    assert!(start.elapsed() >= Duration::from_secs(2));
}
