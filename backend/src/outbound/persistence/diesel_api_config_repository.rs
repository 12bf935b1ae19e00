//! PostgreSQL-backed `ApiConfigRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ApiConfig;
use crate::domain::ports::{ApiConfigRepository, ApiConfigRepositoryError};

use super::error_mapping::{map_basic_diesel_error, map_pool_error};
use super::models::{ApiRow, NewApiRow};
use super::pool::DbPool;
use super::schema::apis;

/// Diesel-backed implementation of the `ApiConfigRepository` port.
#[derive(Clone)]
pub struct DieselApiConfigRepository {
    pool: DbPool,
}

impl DieselApiConfigRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ApiConfigRepositoryError {
    map_basic_diesel_error(
        error,
        ApiConfigRepositoryError::query,
        ApiConfigRepositoryError::connection,
    )
}

fn row_to_config(row: ApiRow) -> Result<ApiConfig, ApiConfigRepositoryError> {
    let max_attempts = u32::try_from(row.max_attempts).map_err(|_| {
        ApiConfigRepositoryError::query(format!(
            "api {} has invalid max_attempts {}",
            row.name, row.max_attempts
        ))
    })?;
    Ok(ApiConfig {
        name: row.name,
        base_url: row.base_url,
        credential: row.credential,
        request_delay_seconds: row.request_delay_seconds,
        max_attempts,
    })
}

fn config_to_row(config: &ApiConfig) -> Result<NewApiRow<'_>, ApiConfigRepositoryError> {
    let max_attempts = i32::try_from(config.max_attempts).map_err(|_| {
        ApiConfigRepositoryError::query(format!(
            "api {} max_attempts {} exceeds the column range",
            config.name, config.max_attempts
        ))
    })?;
    Ok(NewApiRow {
        name: config.name.as_str(),
        base_url: config.base_url.as_str(),
        credential: config.credential.as_str(),
        request_delay_seconds: config.request_delay_seconds,
        max_attempts,
    })
}

#[async_trait]
impl ApiConfigRepository for DieselApiConfigRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiConfig>, ApiConfigRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiConfigRepositoryError::connection))?;

        apis::table
            .filter(apis::name.eq(name))
            .select(ApiRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_config)
            .transpose()
    }

    async fn ensure_defaults(
        &self,
        defaults: &[ApiConfig],
    ) -> Result<usize, ApiConfigRepositoryError> {
        if defaults.is_empty() {
            return Ok(0);
        }
        let rows = defaults
            .iter()
            .map(config_to_row)
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ApiConfigRepositoryError::connection))?;

        let inserted = diesel::insert_into(apis::table)
            .values(&rows)
            .on_conflict(apis::name)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(inserted, "seeded default api rows");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(max_attempts: i32) -> ApiRow {
        ApiRow {
            name: "Routing".to_owned(),
            base_url: "https://router.invalid".to_owned(),
            credential: String::new(),
            request_delay_seconds: 0.5,
            max_attempts,
        }
    }

    #[rstest]
    fn converts_valid_rows() {
        let config = row_to_config(row(3)).expect("valid row");
        assert_eq!(config.name, "Routing");
        assert_eq!(config.max_attempts, 3);
    }

    #[rstest]
    fn rejects_negative_attempt_counts() {
        let error = row_to_config(row(-1)).expect_err("must fail");
        assert!(matches!(error, ApiConfigRepositoryError::Query { .. }));
    }

    #[rstest]
    fn rejects_attempt_counts_beyond_column_range() {
        let config = ApiConfig {
            name: "Routing".to_owned(),
            base_url: "https://router.invalid".to_owned(),
            credential: String::new(),
            request_delay_seconds: 0.5,
            max_attempts: u32::MAX,
        };
        assert!(config_to_row(&config).is_err());
    }
}
