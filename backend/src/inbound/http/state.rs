//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    AddressGeolocation, FixtureAddressGeolocation, FixtureRouteCreation, FixtureRouteLookup,
    RouteCreation, RouteLookup,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Address geolocation use-case.
    pub geolocation: Arc<dyn AddressGeolocation>,
    /// Route creation use-case.
    pub route_creation: Arc<dyn RouteCreation>,
    /// Stored route reads.
    pub route_lookup: Arc<dyn RouteLookup>,
    /// Clock used to age routes in responses.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Bundle the given ports.
    pub fn new(
        geolocation: Arc<dyn AddressGeolocation>,
        route_creation: Arc<dyn RouteCreation>,
        route_lookup: Arc<dyn RouteLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            geolocation,
            route_creation,
            route_lookup,
            clock,
        }
    }
}

impl Default for HttpState {
    /// Fixture ports that touch neither the network nor a database.
    fn default() -> Self {
        Self::new(
            Arc::new(FixtureAddressGeolocation),
            Arc::new(FixtureRouteCreation),
            Arc::new(FixtureRouteLookup),
            Arc::new(DefaultClock),
        )
    }
}
