use actix_web::{web, HttpResponse, Responder};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::api::config::ApiConfig;
use crate::api::models::{
    AuditRequest, ErrorResponse, HealthStatus, ImpactRequest, ImpactResponse, SuggestJob, SuggestRequest,
};
use crate::engine::Engine;
use crate::impact::estimate_monthly_loss;

/// When the server started, for `/health`
#[derive(Debug, Clone, Copy)]
pub struct StartedAt(pub Instant);

/// Audits a batch of links and returns one record per URL in request order.
#[instrument(skip_all, fields(size = request.urls.len()))]
pub async fn audit_handler(
    request: web::Json<AuditRequest>,
    config: web::Data<ApiConfig>,
    engine: web::Data<Engine>,
) -> impl Responder {
    let urls = request.into_inner().urls;
    if urls.len() > config.max_audit_batch {
        warn!("Rejected audit of {} links", urls.len());
        return HttpResponse::PayloadTooLarge().json(ErrorResponse::new(format!(
            "At most {} links can be audited per request",
            config.max_audit_batch
        )));
    }

    let report = engine.auditor.audit(&urls, CancellationToken::new()).await;
    info!(
        "Audit finished: {} links, {} broken, {} from cache",
        report.summary.total, report.summary.broken, report.summary.from_cache
    );
    HttpResponse::Ok().json(report)
}

/// Queues a suggestion job and waits for the worker's outcome.
///
/// An unsuccessful outcome is still a 200; the body explains why no
/// replacement was offered.
#[instrument(skip_all, fields(url = %request.request.original_url))]
pub async fn suggest_handler(
    request: web::Json<SuggestRequest>,
    config: web::Data<ApiConfig>,
    job_tx: web::Data<mpsc::Sender<SuggestJob>>,
) -> impl Responder {
    let request = request.into_inner().into_suggestion_request();

    if request.affiliate_tag.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("affiliateTag is required"));
    }
    if let Err(e) = crate::url_parser::validate_url(&request.original_url) {
        warn!("Rejected invalid URL: {} - {}", request.original_url, e);
        return HttpResponse::BadRequest().json(ErrorResponse::new(format!("Invalid URL: {}", e)));
    }

    let (response_tx, response_rx) = oneshot::channel();
    match job_tx.try_send(SuggestJob { request, response_tx }) {
        Ok(()) => debug!("Suggestion job enqueued"),
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Queue full, rejecting request");
            return HttpResponse::TooManyRequests().json(ErrorResponse::new("Server is busy, try again later."));
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            error!("Worker queue has been closed!");
            return HttpResponse::ServiceUnavailable()
                .json(ErrorResponse::new("Service is shutting down or unavailable."));
        }
    }

    match timeout(config.request_timeout, response_rx).await {
        Ok(Ok(outcome)) => HttpResponse::Ok().json(outcome),
        Ok(Err(_)) => {
            error!("Worker channel closed unexpectedly");
            HttpResponse::InternalServerError().json(ErrorResponse::new("Worker dropped."))
        }
        Err(_) => {
            error!("Request timed out after {:?}", config.request_timeout);
            HttpResponse::RequestTimeout().json(ErrorResponse::new("Request timed out."))
        }
    }
}

pub async fn impact_handler(request: web::Json<ImpactRequest>, engine: web::Data<Engine>) -> impl Responder {
    let request = request.into_inner();
    let settings = request.settings.unwrap_or_else(|| engine.impact.clone());
    let loss = estimate_monthly_loss(request.view_count, request.status, &settings, request.video_age_months);

    HttpResponse::Ok().json(ImpactResponse {
        status: request.status,
        estimated_monthly_loss: loss,
    })
}

/// Reports queue pressure: degraded once the suggestion queue is full.
pub async fn health_check(
    job_tx: web::Data<mpsc::Sender<SuggestJob>>,
    started_at: web::Data<StartedAt>,
) -> impl Responder {
    let capacity = job_tx.max_capacity();
    let free = job_tx.capacity();
    let status = if job_tx.is_closed() {
        "unhealthy"
    } else if free == 0 {
        "degraded"
    } else {
        "healthy"
    };

    debug!("Health check: status={}, free={}/{}", status, free, capacity);
    HttpResponse::Ok().json(HealthStatus {
        status: status.to_string(),
        queued_jobs: capacity - free,
        queue_capacity: capacity,
        uptime_secs: started_at.0.elapsed().as_secs(),
    })
}
