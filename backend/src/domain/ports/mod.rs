//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories and outbound API sources) are implemented by
//! adapters under `outbound`. Driving ports are implemented by domain
//! services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod address_geolocation;
mod address_repository;
mod api_config_repository;
mod api_request_repository;
mod external_call;
mod geocoding_source;
mod route_creation;
mod route_lookup;
mod route_repository;
mod routing_source;

#[cfg(test)]
pub use address_geolocation::MockAddressGeolocation;
pub use address_geolocation::{AddressGeolocation, FixtureAddressGeolocation};
#[cfg(test)]
pub use address_repository::MockAddressRepository;
pub use address_repository::{AddressRepository, AddressRepositoryError, FixtureAddressRepository};
#[cfg(test)]
pub use api_config_repository::MockApiConfigRepository;
pub use api_config_repository::{
    ApiConfigRepository, ApiConfigRepositoryError, FixtureApiConfigRepository,
};
#[cfg(test)]
pub use api_request_repository::MockApiRequestRepository;
pub use api_request_repository::{
    ApiRequestRepository, ApiRequestRepositoryError, FixtureApiRequestRepository,
};
pub use external_call::{ApiEndpoint, ExternalCallError};
#[cfg(test)]
pub use geocoding_source::MockGeocodingSource;
pub use geocoding_source::{FixtureGeocodingSource, GeocodingSource};
#[cfg(test)]
pub use route_creation::MockRouteCreation;
pub use route_creation::{FixtureRouteCreation, RouteCreation};
#[cfg(test)]
pub use route_lookup::MockRouteLookup;
pub use route_lookup::{FixtureRouteLookup, RouteLookup};
#[cfg(test)]
pub use route_repository::MockRouteRepository;
pub use route_repository::{FixtureRouteRepository, RouteRepository, RouteRepositoryError};
#[cfg(test)]
pub use routing_source::MockRoutingSource;
pub use routing_source::{FixtureRoutingSource, RoutingQuery, RoutingSource};
