//! Bounded-attempt executor for throttled outbound calls.
//!
//! One execution owns one request record: it is admitted through the
//! [`RequestThrottle`], the operation is attempted up to the API's budget with
//! a fixed back-off of twice the request delay, and the record always leaves
//! `waiting` before the execution returns.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::domain::Error;
use crate::domain::persistence_mapping::map_api_config_error;
use crate::domain::ports::{ApiConfigRepository, ApiEndpoint, ExternalCallError};

use super::{ApiConfig, ApiRequestRecord, ApiRequestStatus, RequestThrottle, Sleeper};

/// Runs external calls through the throttle with retries.
///
/// Cloning is cheap and shares the underlying throttle.
#[derive(Clone)]
pub struct RetryExecutor {
    apis: Arc<dyn ApiConfigRepository>,
    throttle: Arc<RequestThrottle>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    /// Build an executor over the API registry and throttle.
    pub fn new(
        apis: Arc<dyn ApiConfigRepository>,
        throttle: Arc<RequestThrottle>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            apis,
            throttle,
            sleeper,
        }
    }

    /// Run `operation` against the API named `api_name`.
    ///
    /// The admitted call runs on its own task, so dropping the returned future
    /// does not abandon a request record mid-flight.
    ///
    /// # Errors
    /// - `misconfigured` when no API row named `api_name` exists.
    /// - `not_routable` as soon as the operation reports
    ///   [`ExternalCallError::NotRoutable`]; no further attempts are made.
    /// - `service_unavailable` once every attempt has failed.
    /// - `admission_timeout` when the throttle queue does not drain in time.
    pub async fn execute<T, F, Fut>(&self, api_name: &str, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: Fn(ApiEndpoint) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ExternalCallError>> + Send + 'static,
    {
        let api = self
            .apis
            .find_by_name(api_name)
            .await
            .map_err(map_api_config_error)?
            .ok_or_else(|| {
                error!(api = api_name, "external api is not configured");
                Error::misconfigured(format!("The '{api_name}' API does not exist in the database."))
            })?;

        let this = self.clone();
        tokio::spawn(async move { this.run(api, operation).await })
            .await
            .map_err(|err| Error::internal(format!("external call task failed: {err}")))?
    }

    async fn run<T, F, Fut>(&self, api: ApiConfig, operation: F) -> Result<T, Error>
    where
        F: Fn(ApiEndpoint) -> Fut,
        Fut: Future<Output = Result<T, ExternalCallError>>,
    {
        let record = self.throttle.admit(&api).await?;

        let attempts = AssertUnwindSafe(self.attempt_all(&api, &record, &operation))
            .catch_unwind()
            .await;
        let result = attempts.unwrap_or_else(|_| {
            error!(api = %api.name, request_id = record.id, "external call panicked");
            Err(Error::internal(format!(
                "the call to the {} API failed unexpectedly",
                api.name
            )))
        });

        // No record may stay `waiting` past this point; a no-op when an
        // attempt already settled it.
        if let Err(error) = self.throttle.release(&record, ApiRequestStatus::Error).await {
            warn!(
                api = %api.name,
                request_id = record.id,
                error = %error,
                "failed to settle request record"
            );
        }
        result
    }

    async fn attempt_all<T, F, Fut>(
        &self,
        api: &ApiConfig,
        record: &ApiRequestRecord,
        operation: &F,
    ) -> Result<T, Error>
    where
        F: Fn(ApiEndpoint) -> Fut,
        Fut: Future<Output = Result<T, ExternalCallError>>,
    {
        let endpoint = ApiEndpoint::from(api);
        let max_attempts = api.attempt_budget();

        for attempt in 1..=max_attempts {
            match operation(endpoint.clone()).await {
                Ok(value) => {
                    debug!(api = %api.name, request_id = record.id, attempt, "external call succeeded");
                    self.settle(record, ApiRequestStatus::Finished).await;
                    return Ok(value);
                }
                Err(error) if error.is_terminal() => {
                    info!(api = %api.name, request_id = record.id, attempt, "external api reported no route");
                    return Err(Error::not_routable());
                }
                Err(error) if attempt < max_attempts => {
                    warn!(
                        api = %api.name,
                        request_id = record.id,
                        attempt,
                        max_attempts,
                        error = %error,
                        "external call failed; retrying"
                    );
                    self.sleeper.sleep(api.retry_backoff()).await;
                }
                Err(error) => {
                    warn!(
                        api = %api.name,
                        request_id = record.id,
                        attempt,
                        error = %error,
                        "external call attempts exhausted"
                    );
                    self.settle(record, ApiRequestStatus::Error).await;
                    return Err(Error::service_unavailable(format!(
                        "The external {} API could not be reached. Please try again later.",
                        api.name
                    )));
                }
            }
        }

        Err(Error::internal(
            "unreachable retry control-flow state encountered",
        ))
    }

    async fn settle(&self, record: &ApiRequestRecord, status: ApiRequestStatus) {
        if let Err(error) = self.throttle.release(record, status).await {
            warn!(
                api = %record.api_name,
                request_id = record.id,
                %status,
                error = %error,
                "failed to update request record"
            );
        }
    }
}

#[cfg(test)]
mod tests;
