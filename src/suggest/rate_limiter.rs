use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Token bucket shared by everything that calls the search endpoint.
///
/// Holds up to `capacity` tokens and gains one every `refill_interval`.
/// Starts full.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_interval: refill_interval.max(Duration::from_millis(1)),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// One request per `interval`, no bursting.
    pub fn per_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let gained = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
        state.tokens = (state.tokens + gained).min(self.capacity);
        state.last_refill = now;
    }

    /// Waits until a token is available and takes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state, Instant::now());
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                self.refill_interval.mul_f64(1.0 - state.tokens)
            };
            trace!("Rate limiter waiting {:?}", wait);
            sleep(wait).await;
        }
    }
}
