//! HTTP surface: audit, suggest, impact and health endpoints.

pub mod config;
pub mod handlers;
pub mod models;
pub mod workers;

pub use config::ApiConfig;

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::api::handlers::{audit_handler, health_check, impact_handler, suggest_handler, StartedAt};
use crate::api::models::SuggestJob;
use crate::api::workers::start_workers;
use crate::engine::Engine;

const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Registers every route. Shared with tests so they exercise the same table.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/audit").route(web::post().to(audit_handler)))
        .service(web::resource("/suggest").route(web::post().to(suggest_handler)))
        .service(web::resource("/impact").route(web::post().to(impact_handler)))
        .service(web::resource("/health").route(web::get().to(health_check)));
}

/// Creates the suggestion queue and starts its workers. Must be called
/// inside a Tokio runtime.
pub fn spawn_suggest_queue(engine: &Engine, config: &ApiConfig) -> mpsc::Sender<SuggestJob> {
    let (job_tx, job_rx) = mpsc::channel::<SuggestJob>(config.queue_size.max(1));
    start_workers(job_rx, engine.suggester.clone(), config.workers);
    job_tx
}

#[instrument(skip(engine, config))]
pub async fn start_server(host: &str, port: u16, engine: Engine, config: ApiConfig) -> Result<()> {
    info!("Starting link audit API server on {}:{}", host, port);

    let job_tx = spawn_suggest_queue(&engine, &config);

    let cache = engine.auditor.prober().cache().clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            tick.tick().await;
            let removed = cache.purge_expired().await;
            debug!("Cache purge removed {} entries", removed);
        }
    });

    let job_tx_data = web::Data::new(job_tx);
    let config_data = web::Data::new(config);
    let engine_data = web::Data::new(engine);
    let started_at = web::Data::new(StartedAt(Instant::now()));

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(job_tx_data.clone())
            .app_data(engine_data.clone())
            .app_data(started_at.clone())
            .configure(routes)
    })
    .bind((host, port))
    .map_err(|e| {
        error!("Failed to bind to {}:{}: {}", host, port, e);
        e
    })?
    .run()
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
