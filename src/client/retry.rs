use std::future::Future;
use std::time::{ Duration, SystemTime, UNIX_EPOCH };

use log::warn;

use super::ShaperError;

/// Total attempts for rate-limited calls, including the first.
pub const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;
const MAX_JITTER_MS: u64 = 500;

/// Only rate-limit and overload answers are worth repeating; everything else
/// propagates immediately.
pub fn is_retryable(code: u16) -> bool {
    code == 429 || code == 503
}

/// `2^attempt` seconds plus jitter, so consecutive delays never shrink.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exponential = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(exponential + jitter_ms())
}

// Wall-clock nanoseconds stand in for an RNG; the jitter only has to
// de-synchronize concurrent retriers.
fn jitter_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| (elapsed.subsec_nanos() as u64) % MAX_JITTER_MS)
        .unwrap_or(0)
}

/// Run `op`, repeating on retryable upstream statuses with exponential
/// backoff. The final error is returned untouched once attempts run out.
pub async fn with_backoff<T, F, Fut>(mut op: F) -> Result<T, ShaperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShaperError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(ShaperError::Status { code, .. }) if is_retryable(code) && attempt < MAX_ATTEMPTS => {
                let delay = backoff_delay(attempt);
                warn!(
                    "upstream returned {}, retrying in {:?} (attempt {}/{})",
                    code,
                    delay,
                    attempt,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(delay).await;
            }
            outcome => {
                return outcome;
            }
        }
    }
}
