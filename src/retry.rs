//! Bounded retry with exponential backoff for provider HTTP calls.
//!
//! Only two signals are treated as transient: an HTTP 429 response and a
//! request timeout. Both are retried with the same request parameters.
//! Every other outcome (success, other statuses, transport errors) is handed
//! straight back to the caller.
//!
//! # Backoff Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=jitter)
//! ```
//!
//! Once `max_retries` retries have failed the call ends with
//! [`CollectorError::RetriesExhausted`], which the collector treats as fatal
//! for the current step only.

use rand::{Rng, rng};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::{CollectorError, Result};

/// Retry budget and delays, settable from the YAML settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
    /// Delay before the first retry; doubles with each further retry.
    pub base_delay_ms: u64,
    /// Cap on the exponential part of the delay.
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added to every delay.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        let mut delay = Duration::from_millis(self.base_delay_ms).saturating_mul(1 << shift);
        let cap = Duration::from_millis(self.max_delay_ms);
        if delay > cap {
            delay = cap;
        }
        if self.jitter_ms > 0 {
            let jitter_ms: u64 = rng().random_range(0..=self.jitter_ms);
            delay += Duration::from_millis(jitter_ms);
        }
        delay
    }
}

/// Send the request built by `make_request`, retrying on 429 and timeouts.
///
/// `make_request` is called once per attempt so each retry sends a fresh,
/// identical request. `what` names the call in logs and in the exhaustion
/// error.
pub async fn send_with_backoff<F>(
    policy: &RetryPolicy,
    what: &str,
    make_request: F,
) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        let reason = match make_request().send().await {
            Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                "rate limited (429)".to_string()
            }
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_timeout() => format!("timed out: {e}"),
            Err(e) => return Err(e.into()),
        };

        attempt += 1;
        let total_dt = total_t0.elapsed();

        if attempt > policy.max_retries {
            error!(
                what,
                attempt,
                max = policy.max_retries,
                elapsed_ms_total = total_dt.as_millis(),
                %reason,
                "request exhausted retries"
            );
            return Err(CollectorError::RetriesExhausted {
                what: what.to_string(),
                attempts: attempt,
                reason,
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            what,
            attempt,
            max = policy.max_retries,
            elapsed_ms_total = total_dt.as_millis(),
            ?delay,
            %reason,
            "request attempt failed; backing off"
        );
        sleep(delay).await;
    }
}
