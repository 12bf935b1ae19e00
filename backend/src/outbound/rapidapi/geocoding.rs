//! Geocoding adapter for the TrueWay geocoding API.

use async_trait::async_trait;

use super::client::RapidApiClient;
use super::dto::GeocodeResponseDto;
use crate::domain::Coordinates;
use crate::domain::ports::{ApiEndpoint, ExternalCallError, GeocodingSource};

/// `GeocodingSource` backed by a RapidAPI-hosted geocoder.
#[derive(Clone)]
pub struct RapidApiGeocodingSource {
    client: RapidApiClient,
}

impl RapidApiGeocodingSource {
    /// Wrap a shared client.
    pub fn new(client: RapidApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeocodingSource for RapidApiGeocodingSource {
    async fn geocode(
        &self,
        endpoint: &ApiEndpoint,
        query: &str,
    ) -> Result<Coordinates, ExternalCallError> {
        let params = [("address", query.to_owned()), ("language", "en".to_owned())];
        let body = self.client.get(endpoint, &params).await?;
        parse_location(&body)
    }
}

fn parse_location(body: &[u8]) -> Result<Coordinates, ExternalCallError> {
    let decoded: GeocodeResponseDto = serde_json::from_slice(body).map_err(|error| {
        ExternalCallError::decode(format!("invalid geocoding JSON payload: {error}"))
    })?;
    decoded
        .into_first_location()
        .map_err(ExternalCallError::decode)
}
