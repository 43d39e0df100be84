//! Batch auditing under a fixed concurrency ceiling.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::models::{LinkRecord, LinkStatus};
use crate::prober::Prober;

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum number of probes in flight at once
    pub max_concurrency: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Per-status counts for a finished batch
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total: usize,
    pub broken: usize,
    pub from_cache: usize,
    pub by_status: HashMap<LinkStatus, usize>,
}

impl AuditSummary {
    pub fn from_records(records: &[LinkRecord], from_cache: usize) -> Self {
        let mut by_status = HashMap::new();
        for record in records {
            *by_status.entry(record.status).or_insert(0) += 1;
        }
        Self {
            total: records.len(),
            broken: records.iter().filter(|r| r.status.is_broken()).count(),
            from_cache,
            by_status,
        }
    }

    pub fn count(&self, status: LinkStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Records of a batch, in input order, plus their summary
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub records: Vec<LinkRecord>,
    pub summary: AuditSummary,
}

pub struct AuditCoordinator {
    prober: Arc<Prober>,
    config: AuditConfig,
}

impl AuditCoordinator {
    pub fn new(prober: Arc<Prober>, config: AuditConfig) -> Self {
        Self { prober, config }
    }

    pub fn prober(&self) -> &Arc<Prober> {
        &self.prober
    }

    /// One record per input URL, `result[i]` for `urls[i]`.
    pub async fn audit_links(&self, urls: &[String]) -> Vec<LinkRecord> {
        self.audit(urls, CancellationToken::new()).await.records
    }

    pub async fn audit_links_with_cancel(&self, urls: &[String], cancel: CancellationToken) -> Vec<LinkRecord> {
        self.audit(urls, cancel).await.records
    }

    /// Runs the batch. Cancellation stops dispatch; probes already running
    /// finish, and every slot that never ran is reported as `UNKNOWN`.
    #[instrument(skip(self, urls, cancel), fields(batch = %uuid::Uuid::new_v4(), size = urls.len()))]
    pub async fn audit(&self, urls: &[String], cancel: CancellationToken) -> AuditReport {
        let max_concurrency = self.config.max_concurrency.max(1);
        info!("Auditing {} links with max concurrency {}", urls.len(), max_concurrency);

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let mut handles = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                warn!("Audit cancelled; {} links left undispatched", urls.len() - index);
                break;
            };

            let prober = self.prober.clone();
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                prober.probe(&url).await
            }));
        }

        let mut records = Vec::with_capacity(urls.len());
        let mut from_cache = 0;
        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(outcome) => {
                    if outcome.from_cache {
                        from_cache += 1;
                    }
                    records.push(outcome.record);
                }
                Err(e) => {
                    error!("Probe task for {} failed: {}", urls[index], e);
                    records.push(LinkRecord::unknown(&urls[index]));
                }
            }
        }
        for url in &urls[records.len()..] {
            records.push(LinkRecord::unknown(url));
        }

        let summary = AuditSummary::from_records(&records, from_cache);
        debug!("Audit summary: {:?}", summary);
        AuditReport { records, summary }
    }
}
