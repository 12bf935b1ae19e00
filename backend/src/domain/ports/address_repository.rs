//! Driven port for the geocoded address cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Address, AddressKey, Coordinates};

use super::define_port_error;

define_port_error! {
    /// Errors raised by address repository adapters.
    pub enum AddressRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "address repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "address repository query failed: {message}",
    }
}

/// Port for stored addresses keyed by their normalised identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Fetch the address stored under `key`.
    async fn find_by_key(&self, key: &AddressKey) -> Result<Option<Address>, AddressRepositoryError>;

    /// Insert the address or, when `key` already exists, overwrite its
    /// coordinates and `updated_at` in place.
    ///
    /// Implementations must do this in one atomic statement so concurrent
    /// writers of the same key converge on a single row.
    async fn upsert_coordinates(
        &self,
        key: &AddressKey,
        coordinates: Coordinates,
        updated_at: DateTime<Utc>,
    ) -> Result<Address, AddressRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureAddressRepository;

#[async_trait]
impl AddressRepository for FixtureAddressRepository {
    async fn find_by_key(
        &self,
        _key: &AddressKey,
    ) -> Result<Option<Address>, AddressRepositoryError> {
        Ok(None)
    }

    async fn upsert_coordinates(
        &self,
        key: &AddressKey,
        coordinates: Coordinates,
        updated_at: DateTime<Utc>,
    ) -> Result<Address, AddressRepositoryError> {
        Ok(Address {
            id: 1,
            key: key.clone(),
            coordinates,
            updated_at,
        })
    }
}
