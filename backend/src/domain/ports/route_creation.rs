//! Driving port for creating a route from a raw request payload.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{Error, Route, RouteKey, RouteRequest};

/// Driving port used by inbound adapters to create routes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteCreation: Send + Sync {
    /// Validate `payload`, resolve its addresses, route them, and persist the
    /// result.
    async fn create_route(&self, payload: &Value) -> Result<Route, Error>;
}

const FIXTURE_ROUTE_KEY: &str = "FixtureRouteKey0";

/// Fixture implementation that validates the payload and returns a fixed
/// route without persisting anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureRouteCreation;

#[async_trait]
impl RouteCreation for FixtureRouteCreation {
    async fn create_route(&self, payload: &Value) -> Result<Route, Error> {
        let request = RouteRequest::from_json(payload)?;
        let key = RouteKey::new(FIXTURE_ROUTE_KEY).map_err(|err| Error::internal(err.to_string()))?;
        let steps = i64::try_from(request.intermediates.len() + 1)
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(Route {
            id: 1,
            key,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            connection_ids: (1..=steps).collect(),
        })
    }
}
