//! Address geolocation handler.
//!
//! ```text
//! POST /api/v1/geolocate {"street":"123 Main St","city":"Springfield","state":"IL","postal_code":"62701","country":"USA"}
//! ```

use actix_web::{post, web};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{AddressFields, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Coordinates of a resolved address.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GeolocationResponse {
    /// Latitude in decimal degrees.
    #[schema(example = 39.7817)]
    pub lat: f64,
    /// Longitude in decimal degrees.
    #[schema(example = -89.6501)]
    pub lng: f64,
}

/// Resolve an address to coordinates, geocoding only on a stale cache.
#[utoipa::path(
    post,
    path = "/api/v1/geolocate",
    request_body = crate::inbound::http::schemas::AddressSchema,
    responses(
        (status = 200, description = "Coordinates of the address", body = GeolocationResponse),
        (status = 400, description = "Invalid address", body = Error),
        (status = 503, description = "Geocoding service unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["geolocation"],
    operation_id = "geolocateAddress"
)]
#[post("/geolocate")]
pub async fn geolocate(
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<GeolocationResponse>> {
    let fields = AddressFields::from_json(&payload)?;
    let address = state.geolocation.resolve_address(&fields).await?;
    Ok(web::Json(GeolocationResponse {
        lat: address.coordinates.latitude,
        lng: address.coordinates.longitude,
    }))
}
