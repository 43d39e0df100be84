use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::impact::ImpactSettings;
use crate::models::{LinkStatus, SuggestionOutcome, SuggestionRequest};

/// Request to audit a batch of links
#[derive(Debug, Deserialize, Clone)]
pub struct AuditRequest {
    pub urls: Vec<String>,
}

/// Request for a replacement suggestion.
///
/// With `refresh` set, `previousProductId` is added to the exclusions so the
/// candidate the user just rejected is not offered again.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(flatten)]
    pub request: SuggestionRequest,

    #[serde(default)]
    pub refresh: bool,

    #[serde(default)]
    pub previous_product_id: Option<String>,
}

impl SuggestRequest {
    pub fn into_suggestion_request(self) -> SuggestionRequest {
        let mut request = self.request;
        if self.refresh {
            if let Some(previous) = self.previous_product_id.filter(|id| !id.trim().is_empty()) {
                request.exclude_product_ids.insert(previous.trim().to_string());
            }
        }
        request
    }
}

/// Internal job structure for suggestion tasks
#[derive(Debug)]
pub struct SuggestJob {
    pub request: SuggestionRequest,

    /// Sender for the response channel
    pub response_tx: oneshot::Sender<SuggestionOutcome>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImpactRequest {
    pub view_count: u64,
    pub status: LinkStatus,
    #[serde(default)]
    pub video_age_months: Option<u32>,
    /// Falls back to the server's configured settings
    #[serde(default)]
    pub settings: Option<ImpactSettings>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResponse {
    pub status: LinkStatus,
    pub estimated_monthly_loss: f64,
}

/// Health status response for the /health endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    /// healthy, or degraded when the suggestion queue is full
    pub status: String,

    pub queued_jobs: usize,

    pub queue_capacity: usize,

    pub uptime_secs: u64,
}

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: String,

    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_excludes_previous_candidate() {
        let body = r#"{
            "originalUrl": "https://amzn.to/abc",
            "searchContext": {"videoTitle": "Desk setup"},
            "affiliateTag": "creator-20",
            "excludeProductIds": ["B000000001"],
            "refresh": true,
            "previousProductId": "B000000002"
        }"#;
        let request: SuggestRequest = serde_json::from_str(body).unwrap();
        let request = request.into_suggestion_request();
        assert_eq!(request.exclude_product_ids.len(), 2);
        assert!(request.exclude_product_ids.contains("B000000002"));
    }

    #[test]
    fn test_previous_id_ignored_without_refresh() {
        let body = r#"{
            "originalUrl": "https://amzn.to/abc",
            "searchContext": {"videoTitle": "Desk setup"},
            "affiliateTag": "creator-20",
            "previousProductId": "B000000002"
        }"#;
        let request: SuggestRequest = serde_json::from_str(body).unwrap();
        assert!(request.into_suggestion_request().exclude_product_ids.is_empty());
    }
}
