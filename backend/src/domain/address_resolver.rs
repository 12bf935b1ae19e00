//! Address resolution with a freshness-aware geocode cache.
//!
//! A stored address younger than [`ADDRESS_FRESHNESS_DAYS`] is returned as is.
//! Anything else is geocoded through the retry executor and upserted under its
//! normalised key, so a stale row is refreshed in place rather than
//! duplicated.
//!
//! [`ADDRESS_FRESHNESS_DAYS`]: super::ADDRESS_FRESHNESS_DAYS

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::persistence_mapping::map_address_error;
use crate::domain::ports::{AddressGeolocation, AddressRepository, GeocodingSource};
use crate::domain::{Error, ErrorCode};

use super::{Address, AddressFields, GEOLOCATE_API, RetryExecutor};

/// Message returned when the geocoding API cannot be reached.
pub const GEOLOCATION_UNAVAILABLE: &str =
    "The external geolocation API could not be reached. Please try again tomorrow.";

/// Resolves address fields to stored, geocoded addresses.
pub struct AddressResolver {
    addresses: Arc<dyn AddressRepository>,
    geocoder: Arc<dyn GeocodingSource>,
    executor: RetryExecutor,
    clock: Arc<dyn Clock>,
}

impl AddressResolver {
    /// Build a resolver.
    pub fn new(
        addresses: Arc<dyn AddressRepository>,
        geocoder: Arc<dyn GeocodingSource>,
        executor: RetryExecutor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            addresses,
            geocoder,
            executor,
            clock,
        }
    }

    /// Resolve `fields`, calling the geocoding API only on a cache miss.
    pub async fn resolve(&self, fields: &AddressFields) -> Result<Address, Error> {
        let key = fields.key();
        let now = self.clock.utc();

        if let Some(cached) = self
            .addresses
            .find_by_key(&key)
            .await
            .map_err(map_address_error)?
        {
            if cached.is_fresh(now) {
                debug!(address_id = cached.id, "address cache hit");
                return Ok(cached);
            }
            debug!(
                address_id = cached.id,
                updated_at = %cached.updated_at,
                "cached address is stale"
            );
        } else {
            debug!("address cache miss");
        }

        let query = key.geocode_query();
        let geocoder = Arc::clone(&self.geocoder);
        let coordinates = self
            .executor
            .execute(GEOLOCATE_API, move |endpoint| {
                let geocoder = Arc::clone(&geocoder);
                let query = query.clone();
                async move { geocoder.geocode(&endpoint, &query).await }
            })
            .await
            .map_err(map_geocode_failure)?;

        let address = self
            .addresses
            .upsert_coordinates(&key, coordinates, self.clock.utc())
            .await
            .map_err(map_address_error)?;
        info!(
            address_id = address.id,
            latitude = address.coordinates.latitude,
            longitude = address.coordinates.longitude,
            "address geocoded"
        );
        Ok(address)
    }
}

fn map_geocode_failure(error: Error) -> Error {
    match error.code() {
        ErrorCode::ServiceUnavailable => Error::service_unavailable(GEOLOCATION_UNAVAILABLE),
        _ => error,
    }
}

#[async_trait]
impl AddressGeolocation for AddressResolver {
    async fn resolve_address(&self, fields: &AddressFields) -> Result<Address, Error> {
        self.resolve(fields).await
    }
}
