use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, trace, warn};

use crate::api::models::SuggestJob;
use crate::suggest::SuggestionCoordinator;

/// Starts worker tasks that drain the suggestion queue.
///
/// Workers share one receiver and exit when every sender is dropped.
pub fn start_workers(job_rx: mpsc::Receiver<SuggestJob>, suggester: Arc<SuggestionCoordinator>, workers: usize) {
    let job_rx = Arc::new(Mutex::new(job_rx));

    info!("Spawning {} suggestion worker(s)", workers.max(1));
    for worker_id in 0..workers.max(1) {
        let suggester = suggester.clone();
        let job_rx = job_rx.clone();

        tokio::spawn(async move {
            debug!("Worker {} started", worker_id);
            loop {
                trace!("Worker {} waiting for job", worker_id);
                let job_opt = { job_rx.lock().await.recv().await };

                match job_opt {
                    Some(job) => {
                        debug!("Worker {} processing suggestion for {}", worker_id, job.request.original_url);
                        let outcome = suggester.find_replacement(&job.request).await;
                        if job.response_tx.send(outcome).is_err() {
                            warn!("Worker {} failed to send response - receiver dropped", worker_id);
                        }
                    }
                    None => {
                        info!("Worker {} shutting down - channel closed", worker_id);
                        break;
                    }
                }
            }
        });
    }
}
