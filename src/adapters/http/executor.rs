//! Retrying request executor.
//!
//! Transport errors that may succeed on another attempt (timeouts, refused
//! or dropped connections) are retried with exponential backoff. A received
//! response is returned as is, whatever its status: a non-2xx answer is a
//! broker decision, not a transport problem.
//!
//! Requests with side effects use [`RetryPolicy::before_send_only`], which
//! resends only when the request never reached the broker.

use std::time::Duration;

use reqwest::Method;
use tracing::{debug, info, warn};

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::domain::error::{GatewayError, TransportError, TransportFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub base_backoff: Duration,
    /// Whether failures after the request went out (read timeouts, dropped
    /// connections) are retried.
    pub retry_after_send: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            retry_after_send: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            ..Self::default()
        }
    }

    /// Same attempts and backoff, but only connection setup failures retry.
    pub fn before_send_only(self) -> Self {
        RetryPolicy {
            retry_after_send: false,
            ..self
        }
    }

    fn allows(&self, cause: &TransportError) -> bool {
        if self.retry_after_send {
            cause.is_retryable()
        } else {
            cause.is_before_send()
        }
    }

    /// Wait after the failed attempt with 0-based index `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Clone)]
pub struct RequestExecutor<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> RequestExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        RequestExecutor { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GatewayError> {
        self.execute_with(request, self.policy).await
    }

    /// Like [`execute`](Self::execute) with a per-request policy.
    pub async fn execute_with(
        &self,
        request: &HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse, GatewayError> {
        if request.method != Method::GET && request.method != Method::POST {
            return Err(GatewayError::UnsupportedMethod {
                method: request.method.to_string(),
            });
        }

        let max_attempts = policy.max_retries.max(1);
        let mut attempt = 0;

        loop {
            debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                "sending request"
            );

            match self.transport.send(request).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(url = %request.url, attempt, "request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(cause) => {
                    warn!(
                        url = %request.url,
                        attempt,
                        max_attempts,
                        error = %cause,
                        "request attempt failed"
                    );

                    let attempts = attempt + 1;
                    if !policy.allows(&cause) || attempts >= max_attempts {
                        return Err(TransportFailure { cause, attempts }.into());
                    }

                    tokio::time::sleep(policy.backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
