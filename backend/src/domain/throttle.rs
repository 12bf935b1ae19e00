//! Per-API first-come, first-served admission gate.
//!
//! Every outbound call registers a `waiting` record and may only proceed once
//! that record is the oldest `waiting` record for its API. The record stays
//! `waiting` while the call runs, so at most one call per API is in flight.
//! Admitted calls are additionally spaced by the API's request delay, measured
//! from the admission time stamped on the previous record.
//!
//! Waiters are woken by an in-process notification when a record is released
//! and fall back to polling the store, which also picks up records released by
//! other processes sharing the same database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockable::Clock;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::domain::Error;
use crate::domain::persistence_mapping::map_api_request_error;
use crate::domain::ports::ApiRequestRepository;

use super::{ApiConfig, ApiRequestRecord, ApiRequestStatus, Sleeper};

/// Default bound on how long a caller may wait for admission.
pub const DEFAULT_ADMISSION_TIMEOUT: Duration = Duration::from_secs(600);
/// Default interval between queue polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Throttle timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Longest a caller may wait to reach the head of the queue.
    pub admission_timeout: Duration,
    /// Interval between queue polls while waiting.
    pub poll_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            admission_timeout: DEFAULT_ADMISSION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Default)]
struct Lane {
    released: Notify,
}

/// Serialises outbound calls per API name.
pub struct RequestThrottle {
    requests: Arc<dyn ApiRequestRepository>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    config: ThrottleConfig,
    lanes: Mutex<HashMap<String, Arc<Lane>>>,
}

impl RequestThrottle {
    /// Build a throttle over the persisted request queue.
    pub fn new(
        requests: Arc<dyn ApiRequestRepository>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        config: ThrottleConfig,
    ) -> Self {
        Self {
            requests,
            clock,
            sleeper,
            config,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// Register a call against `api` and wait until it may proceed.
    ///
    /// The returned record is still `waiting`; the caller must hand it back to
    /// [`RequestThrottle::release`]. When admission fails the record has
    /// already been moved to `error`.
    pub async fn admit(&self, api: &ApiConfig) -> Result<ApiRequestRecord, Error> {
        let lane = self.lane(&api.name)?;
        let record = self
            .requests
            .create_waiting(&api.name, self.clock.utc())
            .await
            .map_err(map_api_request_error)?;
        debug!(api = %api.name, request_id = record.id, "request registered with throttle");

        match self.wait_for_turn(&lane, api, &record).await {
            Ok(()) => {
                debug!(api = %api.name, request_id = record.id, "request admitted");
                Ok(record)
            }
            Err(error) => {
                self.abandon(&record).await;
                Err(error)
            }
        }
    }

    /// Move `record` to a terminal `status` and wake the next waiter.
    ///
    /// Returns whether the record was still `waiting`.
    pub async fn release(
        &self,
        record: &ApiRequestRecord,
        status: ApiRequestStatus,
    ) -> Result<bool, Error> {
        let changed = self
            .requests
            .set_status(record.id, status)
            .await
            .map_err(map_api_request_error)?;
        if let Ok(lane) = self.lane(&record.api_name) {
            lane.released.notify_waiters();
        }
        debug!(
            api = %record.api_name,
            request_id = record.id,
            %status,
            changed,
            "request released"
        );
        Ok(changed)
    }

    async fn wait_for_turn(
        &self,
        lane: &Lane,
        api: &ApiConfig,
        record: &ApiRequestRecord,
    ) -> Result<(), Error> {
        let queued =
            tokio::time::timeout(self.config.admission_timeout, self.wait_until_head(lane, record))
                .await;
        match queued {
            Ok(result) => result?,
            Err(_elapsed) => {
                warn!(
                    api = %api.name,
                    request_id = record.id,
                    timeout_secs = self.config.admission_timeout.as_secs(),
                    "throttle admission timed out"
                );
                return Err(Error::admission_timeout(format!(
                    "The request to the {} API waited more than {} seconds for its turn. \
                     Please try again later.",
                    api.name,
                    self.config.admission_timeout.as_secs()
                )));
            }
        }

        self.space_from_previous(record, api.request_delay()).await
    }

    async fn wait_until_head(&self, lane: &Lane, record: &ApiRequestRecord) -> Result<(), Error> {
        loop {
            // Register interest before reading the queue so a release between
            // the read and the wait is not missed.
            let released = lane.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            let head = self
                .requests
                .oldest_waiting(&record.api_name)
                .await
                .map_err(map_api_request_error)?;
            match head {
                None => {
                    error!(
                        api = %record.api_name,
                        request_id = record.id,
                        "throttle queue is empty while a request is waiting"
                    );
                    return Err(Error::misconfigured(format!(
                        "the request queue for the {} API lost request {}",
                        record.api_name, record.id
                    )));
                }
                Some(head) if head.id == record.id => return Ok(()),
                Some(_) => {}
            }

            tokio::select! {
                () = &mut released => {}
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Hold the head of the queue until `delay` has passed since the last
    /// admission recorded for the API, then stamp `record` as admitted.
    ///
    /// Admission times live in the store so spacing holds across processes.
    async fn space_from_previous(
        &self,
        record: &ApiRequestRecord,
        delay: Duration,
    ) -> Result<(), Error> {
        let previous = self
            .requests
            .last_admitted_at(&record.api_name)
            .await
            .map_err(map_api_request_error)?;
        if let Some(previous) = previous {
            let elapsed = (self.clock.utc() - previous)
                .to_std()
                .unwrap_or(Duration::ZERO);
            let remaining = delay.saturating_sub(elapsed);
            if !remaining.is_zero() {
                debug!(
                    api = %record.api_name,
                    request_id = record.id,
                    wait_ms = remaining.as_millis(),
                    "spacing request from previous admission"
                );
                self.sleeper.sleep(remaining).await;
            }
        }
        self.requests
            .mark_admitted(record.id, self.clock.utc())
            .await
            .map_err(map_api_request_error)
    }

    async fn abandon(&self, record: &ApiRequestRecord) {
        if let Err(error) = self.release(record, ApiRequestStatus::Error).await {
            warn!(
                api = %record.api_name,
                request_id = record.id,
                error = %error,
                "failed to abandon throttle request"
            );
        }
    }

    fn lane(&self, api_name: &str) -> Result<Arc<Lane>, Error> {
        let mut lanes = self
            .lanes
            .lock()
            .map_err(|_| Error::internal("throttle lane map poisoned"))?;
        Ok(Arc::clone(lanes.entry(api_name.to_owned()).or_default()))
    }
}
