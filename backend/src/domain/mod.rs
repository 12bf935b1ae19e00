//! Domain primitives, services, and ports.
//!
//! Purpose: Define the route planner's entities and the services that
//! geocode addresses, pace calls to external APIs, and turn routing output
//! into stored routes. Everything here is transport- and storage-agnostic;
//! adapters plug in through the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - AddressResolver: cached geocoding of one address.
//! - RouteOrchestrator: route creation from a raw request payload.
//! - RouteQuery: read access to stored routes.
//! - StartupMaintenance: queue and registry housekeeping at boot.

pub mod address;
pub mod address_resolver;
pub mod error;
pub mod external_api;
pub mod geodesy;
pub mod maintenance;
pub(crate) mod persistence_mapping;
pub mod ports;
pub mod retry;
pub mod route;
pub mod route_assembler;
pub mod route_details;
pub mod route_orchestrator;
pub mod route_query;
pub mod route_request;
pub mod runtime;
pub mod throttle;

pub use self::address::{
    ADDRESS_FIELD_NAMES, ADDRESS_FRESHNESS_DAYS, Address, AddressFields, AddressId, AddressKey,
    AddressValidationError, Coordinates, normalize_component,
};
pub use self::address_resolver::{AddressResolver, GEOLOCATION_UNAVAILABLE};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::external_api::{
    ApiConfig, ApiRequestId, ApiRequestRecord, ApiRequestStatus, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REQUEST_DELAY_SECONDS, GEOLOCATE_API, ParseApiRequestStatusError, ROUTING_API,
};
pub use self::geodesy::geodesic_distance_m;
pub use self::maintenance::{MaintenanceReport, StartupMaintenance};
pub use self::retry::RetryExecutor;
pub use self::route::{
    AddressConnection, AddressConnectionId, AvoidFlags, NewAddressConnection, ROUTE_KEY_LENGTH,
    Route, RouteId, RouteKey, RouteKeyValidationError, RouteLeg,
};
pub use self::route_assembler::{MAX_ROUTE_KEY_ATTEMPTS, MatchedLeg, RouteAssembler, match_legs};
pub use self::route_details::{
    RouteDetails, RouteStep, format_leg_travel_time, format_total_travel_time,
};
pub use self::route_orchestrator::RouteOrchestrator;
pub use self::route_query::RouteQuery;
pub use self::route_request::{
    MAX_INTERMEDIATE_ADDRESSES, RouteRequest, RouteRequestValidationError,
};
#[cfg(test)]
pub use self::runtime::{MockRouteKeyGenerator, MockSleeper};
pub use self::runtime::{RandomRouteKeyGenerator, RouteKeyGenerator, Sleeper, TokioSleeper};
pub use self::throttle::{
    DEFAULT_ADMISSION_TIMEOUT, DEFAULT_POLL_INTERVAL, RequestThrottle, ThrottleConfig,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use route_planner::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::not_found("no such route"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
