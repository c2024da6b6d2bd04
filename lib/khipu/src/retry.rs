//! Retry policy for the default transport.
//!
//! A request is retried when:
//! - no response was obtained (connection, TLS or timeout failure),
//! - the server answered 409 Conflict,
//! - the server answered 5xx and replaying is safe: the method is `GET` or
//!   `DELETE`, or the request carries an `Idempotency-Key`.
//!
//! Delays grow exponentially from the initial delay and are capped.

use std::time::Duration;

use tokio::time::Sleep;
use tower::retry::Policy;
use tracing::debug;

use crate::{ClientConfig, Error, IDEMPOTENCY_KEY_HEADER, Request, Response};

/// Exponential backoff retry policy.
///
/// Tower clones the policy for every request, so the attempt counters start
/// fresh for each call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
    attempt: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a retry policy with the given maximum number of retries.
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            remaining: max_retries,
            attempt: 0,
            initial_delay,
            max_delay,
        }
    }

    /// Create a retry policy from the transport configuration.
    #[must_use]
    pub const fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.max_network_retries,
            config.initial_retry_delay,
            config.max_retry_delay,
        )
    }

    /// Delay before the retry following `attempt` previous retries.
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Returns `true` if the outcome of `request` should be retried.
    fn should_retry(request: &Request, result: &Result<Response, Error>) -> bool {
        match result {
            Ok(response) => match response.status() {
                409 => true,
                500..=599 => {
                    request.method().is_idempotent()
                        || request.header(IDEMPOTENCY_KEY_HEADER).is_some()
                }
                _ => false,
            },
            Err(error) => error.is_connection(),
        }
    }
}

impl Policy<Request, Response, Error> for RetryPolicy {
    type Future = Sleep;

    fn retry(
        &mut self,
        request: &mut Request,
        result: &mut Result<Response, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 || !Self::should_retry(request, result) {
            return None;
        }

        let delay = self.delay_for(self.attempt);
        self.remaining -= 1;
        self.attempt += 1;

        debug!(
            method = %request.method(),
            url = %request.url(),
            status = result.as_ref().ok().map(Response::status),
            attempt = self.attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Retrying Khipu request"
        );
        Some(tokio::time::sleep(delay))
    }

    fn clone_request(&mut self, request: &Request) -> Option<Request> {
        Some(request.clone())
    }
}
