//! PostgreSQL-backed `ApiRequestRepository` implementation.
//!
//! Status transitions are guarded in SQL (`WHERE status = 'waiting'`), so a
//! record that already reached a terminal state is never rewritten, even by
//! concurrent writers.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::info;

use crate::domain::ports::{ApiRequestRepository, ApiRequestRepositoryError};
use crate::domain::{ApiRequestId, ApiRequestRecord, ApiRequestStatus};

use super::error_mapping::{map_basic_diesel_error, map_pool_error};
use super::models::{ApiRequestRow, NewApiRequestRow};
use super::pool::DbPool;
use super::schema::api_requests;

/// Diesel-backed implementation of the `ApiRequestRepository` port.
#[derive(Clone)]
pub struct DieselApiRequestRepository {
    pool: DbPool,
}

impl DieselApiRequestRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ApiRequestRepositoryError {
    map_basic_diesel_error(
        error,
        ApiRequestRepositoryError::query,
        ApiRequestRepositoryError::connection,
    )
}

fn row_to_record(row: ApiRequestRow) -> Result<ApiRequestRecord, ApiRequestRepositoryError> {
    let status = ApiRequestStatus::from_str(&row.status).map_err(|err| {
        ApiRequestRepositoryError::query(format!("invalid status in database: {err}"))
    })?;
    Ok(ApiRequestRecord {
        id: row.id,
        api_name: row.api_name,
        requested_at: row.requested_at,
        status,
    })
}

#[async_trait]
impl ApiRequestRepository for DieselApiRequestRepository {
    async fn create_waiting(
        &self,
        api_name: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<ApiRequestRecord, ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        let row = diesel::insert_into(api_requests::table)
            .values(&NewApiRequestRow {
                api_name,
                requested_at,
                status: ApiRequestStatus::Waiting.as_str(),
            })
            .returning(ApiRequestRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_record(row)
    }

    async fn oldest_waiting(
        &self,
        api_name: &str,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        api_requests::table
            .filter(api_requests::api_name.eq(api_name))
            .filter(api_requests::status.eq(ApiRequestStatus::Waiting.as_str()))
            .order(api_requests::id.asc())
            .select(ApiRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_record)
            .transpose()
    }

    async fn set_status(
        &self,
        id: ApiRequestId,
        status: ApiRequestStatus,
    ) -> Result<bool, ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        let updated = diesel::update(
            api_requests::table
                .filter(api_requests::id.eq(id))
                .filter(api_requests::status.eq(ApiRequestStatus::Waiting.as_str())),
        )
        .set(api_requests::status.eq(status.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn mark_admitted(
        &self,
        id: ApiRequestId,
        admitted_at: DateTime<Utc>,
    ) -> Result<(), ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        let updated = diesel::update(api_requests::table.find(id))
            .set(api_requests::admitted_at.eq(Some(admitted_at)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(ApiRequestRepositoryError::query(format!("no request record {id}")));
        }
        Ok(())
    }

    async fn last_admitted_at(
        &self,
        api_name: &str,
    ) -> Result<Option<DateTime<Utc>>, ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        api_requests::table
            .filter(api_requests::api_name.eq(api_name))
            .select(diesel::dsl::max(api_requests::admitted_at))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        id: ApiRequestId,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        api_requests::table
            .find(id)
            .select(ApiRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_record)
            .transpose()
    }

    async fn fail_all_waiting(&self) -> Result<u64, ApiRequestRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiRequestRepositoryError::connection))?;

        let updated = diesel::update(
            api_requests::table
                .filter(api_requests::status.eq(ApiRequestStatus::Waiting.as_str())),
        )
        .set(api_requests::status.eq(ApiRequestStatus::Error.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if updated > 0 {
            info!(updated, "failed stale waiting api requests");
        }
        u64::try_from(updated)
            .map_err(|err| ApiRequestRepositoryError::query(format!("row count overflow: {err}")))
    }
}
