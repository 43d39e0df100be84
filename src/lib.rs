//! Affiliate link auditing and replacement suggestions.
//!
//! [`audit::AuditCoordinator`] probes a batch of links under a concurrency
//! ceiling and classifies each into a [`models::LinkStatus`].
//! [`suggest::SuggestionCoordinator`] searches the marketplace for a real
//! replacement for a broken link and scores what it finds.

pub mod api;
pub mod audit;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod impact;
pub mod models;
pub mod prober;
pub mod scoring;
pub mod search;
pub mod suggest;
pub mod url_parser;
pub mod utils;

pub use config::AppConfig;
pub use engine::Engine;
pub use models::{Candidate, LinkRecord, LinkStatus, SearchContext, SuggestionOutcome, SuggestionRequest};
