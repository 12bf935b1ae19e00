//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together with
//! the request, response and error schemas. The generated document is served
//! by Swagger UI in debug builds and printed by the `openapi-dump` binary.

use utoipa::OpenApi;

use crate::domain::{AvoidFlags, Error, ErrorCode};
use crate::inbound::http::geolocate::GeolocationResponse;
use crate::inbound::http::routes::{
    CreatedRouteResponse, RouteView, StepView, StopView, TotalsView,
};
use crate::inbound::http::schemas::{AddressSchema, RouteRequestSchema};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Route planner API",
        description = "Geocode addresses and plan multi-stop driving routes.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::geolocate::geolocate,
        crate::inbound::http::routes::create_route,
        crate::inbound::http::routes::get_route,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        AvoidFlags,
        AddressSchema,
        RouteRequestSchema,
        GeolocationResponse,
        CreatedRouteResponse,
        RouteView,
        StepView,
        StopView,
        TotalsView,
    )),
    tags(
        (name = "geolocation", description = "Address geocoding"),
        (name = "routes", description = "Route creation and lookup"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
