use thiserror::Error;

/// Failure to retrieve a page. Every variant is an expected operational
/// condition and is retryable on a later run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by upstream (status {status})")]
    RateLimited { status: u16 },

    #[error("scraping provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failure of a marketplace search request
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("search endpoint returned status {0}")]
    UpstreamStatus(u16),

    #[error("search endpoint served a bot check instead of results")]
    Blocked,

    #[error("search query is empty")]
    EmptyQuery,
}

impl SearchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Fetch(FetchError::InvalidUrl(_)) => false,
            SearchError::Fetch(_) => true,
            SearchError::UpstreamStatus(status) => *status == 429 || *status >= 500,
            SearchError::Blocked => true,
            SearchError::EmptyQuery => false,
        }
    }
}

/// Reasons a replacement suggestion could not be produced
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("could not derive a search query from the video context")]
    EmptyContext,

    #[error("affiliate tag is required to build a replacement link")]
    MissingAffiliateTag,

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("no reliable replacement found for \"{query}\"")]
    NoCandidateFound { query: String },

    #[error("best candidate scored {score}, below the minimum confidence of {minimum}")]
    BelowThreshold { score: u8, minimum: u8 },
}

impl SuggestionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SuggestionError::Search(e) => e.is_retryable(),
            SuggestionError::EmptyContext
            | SuggestionError::MissingAffiliateTag
            | SuggestionError::NoCandidateFound { .. }
            | SuggestionError::BelowThreshold { .. } => false,
        }
    }
}
