//! Driving port for resolving one address to stored coordinates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Address, AddressFields, Coordinates, Error};

/// Driving port used by inbound adapters to geolocate an address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressGeolocation: Send + Sync {
    /// Resolve `fields` to a stored address, geocoding only when the cached
    /// row is missing or stale.
    async fn resolve_address(&self, fields: &AddressFields) -> Result<Address, Error>;
}

/// Fixture implementation placing every address at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureAddressGeolocation;

#[async_trait]
impl AddressGeolocation for FixtureAddressGeolocation {
    async fn resolve_address(&self, fields: &AddressFields) -> Result<Address, Error> {
        Ok(Address {
            id: 1,
            key: fields.key(),
            coordinates: Coordinates::new(0.0, 0.0),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        })
    }
}
