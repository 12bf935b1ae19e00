//! Driven port for per-API configuration rows.

use async_trait::async_trait;

use crate::domain::ApiConfig;

use super::define_port_error;

define_port_error! {
    /// Errors raised by API configuration repository adapters.
    pub enum ApiConfigRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "api config repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "api config repository query failed: {message}",
    }
}

/// Port for reading and seeding external API configuration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiConfigRepository: Send + Sync {
    /// Fetch the configuration row for `name`.
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiConfig>, ApiConfigRepositoryError>;

    /// Insert each default whose name has no row yet; existing rows are left
    /// untouched. Returns the number of rows inserted.
    async fn ensure_defaults(
        &self,
        defaults: &[ApiConfig],
    ) -> Result<usize, ApiConfigRepositoryError>;
}

/// Fixture implementation with no configured APIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureApiConfigRepository;

#[async_trait]
impl ApiConfigRepository for FixtureApiConfigRepository {
    async fn find_by_name(
        &self,
        _name: &str,
    ) -> Result<Option<ApiConfig>, ApiConfigRepositoryError> {
        Ok(None)
    }

    async fn ensure_defaults(
        &self,
        _defaults: &[ApiConfig],
    ) -> Result<usize, ApiConfigRepositoryError> {
        Ok(0)
    }
}
