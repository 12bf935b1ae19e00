//! Route creation and lookup handlers.
//!
//! ```text
//! POST /api/v1/routes {"start_address":{...},"intermediate_addresses":[...],"end_address":{...}}
//! GET /api/v1/routes/{route_key}
//! ```

use actix_web::{HttpResponse, get, http::header, post, web};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{Address, AvoidFlags, Error, RouteDetails, RouteStep};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Response body for a freshly created route.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRouteResponse {
    /// Public key of the stored route.
    #[schema(example = "aB3dE5gH7jK9mN1p")]
    pub route_key: String,
    /// Relative URL at which the route can be read back.
    #[schema(example = "/routes/aB3dE5gH7jK9mN1p")]
    pub route_url: String,
}

/// One stop as presented to clients.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopView {
    /// Street line.
    #[schema(example = "123 Main St")]
    pub line_one: String,
    /// `City, ST 12345`.
    #[schema(example = "Springfield, Il 62701")]
    pub line_two: String,
    /// Country.
    #[schema(example = "Usa")]
    pub line_three: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl From<&Address> for StopView {
    fn from(address: &Address) -> Self {
        Self {
            line_one: address.line_one(),
            line_two: address.line_two(),
            line_three: address.line_three(),
            lat: address.coordinates.latitude,
            lng: address.coordinates.longitude,
        }
    }
}

/// One step of a stored route.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    /// Zero-based position in the route.
    pub order: u32,
    /// Where the step starts.
    pub from: StopView,
    /// Where the step ends.
    pub to: StopView,
    /// Distance in kilometres.
    pub distance_km: f64,
    /// Distance in miles.
    pub distance_miles: f64,
    /// Travel time such as `1 hour and 5 minutes`.
    pub travel_time: String,
    /// Travel time in seconds.
    pub travel_seconds: i64,
}

impl From<&RouteStep> for StepView {
    fn from(step: &RouteStep) -> Self {
        Self {
            order: step.order,
            from: StopView::from(&step.from),
            to: StopView::from(&step.to),
            distance_km: step.distance_km(),
            distance_miles: step.distance_miles(),
            travel_time: step.travel_time(),
            travel_seconds: step.travel_seconds,
        }
    }
}

/// Route totals.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    /// Total distance in kilometres.
    pub distance_km: f64,
    /// Total distance in miles.
    pub distance_miles: f64,
    /// Total time such as `1 day, 2 hours, and 5 minutes`.
    pub travel_time: String,
    /// Total time in seconds.
    pub travel_seconds: i64,
}

/// A stored route as returned by `GET /api/v1/routes/{route_key}`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    /// Public key.
    #[schema(example = "aB3dE5gH7jK9mN1p")]
    pub key: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Whole calendar days since the route was created.
    pub days_since_creation: i64,
    /// Routing options.
    pub avoid: AvoidFlags,
    /// Totals across every step.
    pub totals: TotalsView,
    /// Steps in travel order.
    pub steps: Vec<StepView>,
}

impl RouteView {
    fn new(details: &RouteDetails, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            key: details.key.to_string(),
            created_at: details.created_at.to_rfc3339(),
            days_since_creation: details.days_since_creation(now),
            avoid: details.avoid,
            totals: TotalsView {
                distance_km: details.total_distance_km(),
                distance_miles: details.total_distance_miles(),
                travel_time: details.total_travel_time(),
                travel_seconds: details.total_travel_seconds(),
            },
            steps: details.steps.iter().map(StepView::from).collect(),
        }
    }
}

/// Create a route through every supplied stop.
#[utoipa::path(
    post,
    path = "/api/v1/routes",
    request_body = crate::inbound::http::schemas::RouteRequestSchema,
    responses(
        (status = 201, description = "Route created", body = CreatedRouteResponse,
            headers(("Location" = String, description = "API URL of the stored route"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 422, description = "No drivable route between the stops", body = Error),
        (status = 503, description = "External service unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["routes"],
    operation_id = "createRoute"
)]
#[post("/routes")]
pub async fn create_route(
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let route = state.route_creation.create_route(&payload).await?;
    let route_url = format!("/routes/{}", route.key);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/v1/routes/{}", route.key)))
        .json(CreatedRouteResponse {
            route_key: route.key.to_string(),
            route_url,
        }))
}

/// Read a stored route.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{route_key}",
    params(("route_key" = String, Path, description = "Sixteen-character route key")),
    responses(
        (status = 200, description = "Stored route", body = RouteView),
        (status = 404, description = "Unknown route", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["routes"],
    operation_id = "getRoute"
)]
#[get("/routes/{route_key}")]
pub async fn get_route(
    state: web::Data<HttpState>,
    route_key: web::Path<String>,
) -> ApiResult<web::Json<RouteView>> {
    let details = state.route_lookup.find_route(&route_key).await?;
    Ok(web::Json(RouteView::new(&details, state.clock.utc())))
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
