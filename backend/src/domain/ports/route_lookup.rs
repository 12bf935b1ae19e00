//! Driving port for reading stored routes.

use async_trait::async_trait;

use crate::domain::{Error, RouteDetails};

/// Driving port used by inbound adapters to read routes by public key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteLookup: Send + Sync {
    /// Fetch the route stored under `route_key`.
    ///
    /// Malformed and unknown keys both yield `not_found`.
    async fn find_route(&self, route_key: &str) -> Result<RouteDetails, Error>;
}

/// Fixture implementation that knows no routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureRouteLookup;

#[async_trait]
impl RouteLookup for FixtureRouteLookup {
    async fn find_route(&self, route_key: &str) -> Result<RouteDetails, Error> {
        Err(Error::not_found(format!("route {route_key} not found")))
    }
}
