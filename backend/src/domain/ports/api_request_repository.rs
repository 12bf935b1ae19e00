//! Driven port for throttle request records.
//!
//! Records form the per-API admission queue: the oldest `waiting` record for
//! an API is the only one allowed to call it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ApiRequestId, ApiRequestRecord, ApiRequestStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by request record repository adapters.
    pub enum ApiRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "api request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "api request repository query failed: {message}",
    }
}

/// Port for the persisted per-API admission queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiRequestRepository: Send + Sync {
    /// Register a new `waiting` record for `api_name`.
    async fn create_waiting(
        &self,
        api_name: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<ApiRequestRecord, ApiRequestRepositoryError>;

    /// Oldest `waiting` record for `api_name`, ordered by identifier.
    async fn oldest_waiting(
        &self,
        api_name: &str,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError>;

    /// Move a `waiting` record to `status`.
    ///
    /// Records already in a terminal state are left unchanged. Returns whether
    /// a transition happened.
    async fn set_status(
        &self,
        id: ApiRequestId,
        status: ApiRequestStatus,
    ) -> Result<bool, ApiRequestRepositoryError>;

    /// Stamp `id` with the moment the throttle let it through.
    async fn mark_admitted(
        &self,
        id: ApiRequestId,
        admitted_at: DateTime<Utc>,
    ) -> Result<(), ApiRequestRepositoryError>;

    /// Most recent admission time across every record for `api_name`.
    async fn last_admitted_at(
        &self,
        api_name: &str,
    ) -> Result<Option<DateTime<Utc>>, ApiRequestRepositoryError>;

    /// Fetch one record.
    async fn find(
        &self,
        id: ApiRequestId,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError>;

    /// Move every `waiting` record, for every API, to `error`. Returns the
    /// number of records changed.
    async fn fail_all_waiting(&self) -> Result<u64, ApiRequestRepositoryError>;
}

/// Fixture implementation that admits every caller immediately.
///
/// Every created record reports itself as the oldest waiting one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureApiRequestRepository;

const FIXTURE_REQUEST_ID: ApiRequestId = 1;

#[async_trait]
impl ApiRequestRepository for FixtureApiRequestRepository {
    async fn create_waiting(
        &self,
        api_name: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<ApiRequestRecord, ApiRequestRepositoryError> {
        Ok(ApiRequestRecord {
            id: FIXTURE_REQUEST_ID,
            api_name: api_name.to_owned(),
            requested_at,
            status: ApiRequestStatus::Waiting,
        })
    }

    async fn oldest_waiting(
        &self,
        api_name: &str,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError> {
        Ok(Some(ApiRequestRecord {
            id: FIXTURE_REQUEST_ID,
            api_name: api_name.to_owned(),
            requested_at: DateTime::<Utc>::UNIX_EPOCH,
            status: ApiRequestStatus::Waiting,
        }))
    }

    async fn set_status(
        &self,
        _id: ApiRequestId,
        _status: ApiRequestStatus,
    ) -> Result<bool, ApiRequestRepositoryError> {
        Ok(true)
    }

    async fn mark_admitted(
        &self,
        _id: ApiRequestId,
        _admitted_at: DateTime<Utc>,
    ) -> Result<(), ApiRequestRepositoryError> {
        Ok(())
    }

    async fn last_admitted_at(
        &self,
        _api_name: &str,
    ) -> Result<Option<DateTime<Utc>>, ApiRequestRepositoryError> {
        Ok(None)
    }

    async fn find(
        &self,
        _id: ApiRequestId,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError> {
        Ok(None)
    }

    async fn fail_all_waiting(&self) -> Result<u64, ApiRequestRepositoryError> {
        Ok(0)
    }
}
