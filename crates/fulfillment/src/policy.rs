//! Timeout and retry policy for outbound collaborator calls.

use std::future::Future;
use std::time::Duration;

use domain::ServiceError;

/// Whether a call may be repeated after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Reads: retried once on timeout or unavailability when the policy allows.
    Retryable,
    /// Mutations: attempted exactly once.
    Once,
}

/// Bounds every collaborator call with a timeout and at most one retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    timeout: Duration,
    retries: u32,
}

impl CallPolicy {
    /// Creates a policy. `retries` is clamped to 0 or 1.
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries: retries.min(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Runs `op` under the timeout, retrying `Retryable` calls that time out
    /// or report `UpstreamUnavailable`.
    ///
    /// Any other error is returned immediately.
    pub async fn call<T, F, Fut>(
        &self,
        collaborator: &'static str,
        idempotency: Idempotency,
        mut op: F,
    ) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let attempts = match idempotency {
            Idempotency::Retryable => 1 + self.retries,
            Idempotency::Once => 1,
        };

        let mut last_error = None;
        for attempt in 1..=attempts {
            let error = match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(ServiceError::UpstreamUnavailable(msg))) => {
                    ServiceError::UpstreamUnavailable(msg)
                }
                Ok(Err(other)) => {
                    metrics::counter!("upstream_call_failures_total", "collaborator" => collaborator)
                        .increment(1);
                    return Err(other);
                }
                Err(_) => ServiceError::UpstreamUnavailable(format!(
                    "{collaborator} did not answer within {}ms",
                    self.timeout.as_millis()
                )),
            };

            metrics::counter!("upstream_call_failures_total", "collaborator" => collaborator)
                .increment(1);
            tracing::warn!(collaborator, attempt, error = %error, "upstream call failed");
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| {
            ServiceError::UpstreamUnavailable(format!("{collaborator} was not called"))
        }))
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 1)
    }
}
