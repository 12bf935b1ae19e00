//! Driven port for turning a one-line address into coordinates.

use async_trait::async_trait;

use crate::domain::Coordinates;

use super::{ApiEndpoint, ExternalCallError};

/// Port for the external geocoding API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeocodingSource: Send + Sync {
    /// Geocode `query` and return the first result's coordinates.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use route_planner::domain::ports::{ApiEndpoint, FixtureGeocodingSource, GeocodingSource};
    ///
    /// let endpoint = ApiEndpoint {
    ///     api_name: "Geolocate".to_owned(),
    ///     base_url: "https://geocoder.invalid/Geocode".to_owned(),
    ///     credential: "key".to_owned(),
    /// };
    /// let coordinates = FixtureGeocodingSource
    ///     .geocode(&endpoint, "1 MAIN ST, SPRINGFIELD, IL, USA 62701")
    ///     .await?;
    /// assert_eq!(coordinates.latitude, 0.0);
    /// # Ok::<(), route_planner::domain::ports::ExternalCallError>(())
    /// ```
    async fn geocode(
        &self,
        endpoint: &ApiEndpoint,
        query: &str,
    ) -> Result<Coordinates, ExternalCallError>;
}

/// Fixture implementation placing every address at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureGeocodingSource;

#[async_trait]
impl GeocodingSource for FixtureGeocodingSource {
    async fn geocode(
        &self,
        _endpoint: &ApiEndpoint,
        _query: &str,
    ) -> Result<Coordinates, ExternalCallError> {
        Ok(Coordinates::new(0.0, 0.0))
    }
}
