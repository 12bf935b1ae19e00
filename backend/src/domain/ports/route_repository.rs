//! Driven port for address connections and stored routes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AddressConnection, AddressConnectionId, NewAddressConnection, Route, RouteDetails, RouteKey,
};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the persistence adapter when handling routes.
    pub enum RouteRepositoryError {
        /// Database connectivity or transaction failures.
        Connection { message: String } =>
            "route repository connection failed: {message}",
        /// The route key is already taken by another route.
        DuplicateKey { route_key: String } =>
            "route key {route_key} is already in use",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "route repository query failed: {message}",
    }
}

/// Port for route persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Insert the connection or refresh the distance and duration of the
    /// existing row with the same endpoints and avoid flags.
    async fn upsert_connection(
        &self,
        connection: &NewAddressConnection,
    ) -> Result<AddressConnection, RouteRepositoryError>;

    /// Create a route and one step per connection, in order, atomically.
    ///
    /// Returns [`RouteRepositoryError::DuplicateKey`] without writing anything
    /// when `key` is taken.
    async fn create_route(
        &self,
        key: &RouteKey,
        connection_ids: &[AddressConnectionId],
        created_at: DateTime<Utc>,
    ) -> Result<Route, RouteRepositoryError>;

    /// Fetch a route with its ordered steps and their addresses.
    async fn find_by_key(&self, key: &RouteKey)
    -> Result<Option<RouteDetails>, RouteRepositoryError>;

    /// Delete a route and its steps. Connections and addresses stay.
    /// Returns whether a route was removed.
    async fn delete_route(&self, key: &RouteKey) -> Result<bool, RouteRepositoryError>;

    /// Delete one step and, with it, the owning route.
    /// Returns whether a step was removed.
    async fn delete_route_step(
        &self,
        key: &RouteKey,
        order: u32,
    ) -> Result<bool, RouteRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureRouteRepository;

#[async_trait]
impl RouteRepository for FixtureRouteRepository {
    async fn upsert_connection(
        &self,
        connection: &NewAddressConnection,
    ) -> Result<AddressConnection, RouteRepositoryError> {
        Ok(AddressConnection {
            id: 1,
            from_address: connection.from_address,
            to_address: connection.to_address,
            avoid: connection.avoid,
            distance_meters: connection.distance_meters,
            travel_seconds: connection.travel_seconds,
        })
    }

    async fn create_route(
        &self,
        key: &RouteKey,
        connection_ids: &[AddressConnectionId],
        created_at: DateTime<Utc>,
    ) -> Result<Route, RouteRepositoryError> {
        Ok(Route {
            id: 1,
            key: key.clone(),
            created_at,
            connection_ids: connection_ids.to_vec(),
        })
    }

    async fn find_by_key(
        &self,
        _key: &RouteKey,
    ) -> Result<Option<RouteDetails>, RouteRepositoryError> {
        Ok(None)
    }

    async fn delete_route(&self, _key: &RouteKey) -> Result<bool, RouteRepositoryError> {
        Ok(false)
    }

    async fn delete_route_step(
        &self,
        _key: &RouteKey,
        _order: u32,
    ) -> Result<bool, RouteRepositoryError> {
        Ok(false)
    }
}
