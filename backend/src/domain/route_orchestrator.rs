//! Route creation: validate, geocode, route, and store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::ports::{AddressGeolocation, RouteCreation, RoutingQuery, RoutingSource};
use crate::domain::Error;

use super::{
    Address, AddressFields, ROUTING_API, RetryExecutor, Route, RouteAssembler, RouteRequest,
};

const ADDRESS_CONTEXT: &str = "Could not parse address data";

/// Entry point for creating routes from raw request payloads.
pub struct RouteOrchestrator {
    addresses: Arc<dyn AddressGeolocation>,
    router: Arc<dyn RoutingSource>,
    executor: RetryExecutor,
    assembler: RouteAssembler,
}

impl RouteOrchestrator {
    /// Build an orchestrator.
    pub fn new(
        addresses: Arc<dyn AddressGeolocation>,
        router: Arc<dyn RoutingSource>,
        executor: RetryExecutor,
        assembler: RouteAssembler,
    ) -> Self {
        Self {
            addresses,
            router,
            executor,
            assembler,
        }
    }

    /// Create a route for an already validated request.
    ///
    /// # Errors
    /// - `invalid_request` when an address cannot be geocoded from its data.
    /// - `not_routable` when the routing API finds no drivable path.
    /// - `service_unavailable` or `admission_timeout` when an external API
    ///   cannot be used.
    /// - `reconciliation_failed` when the returned legs do not fit the stops.
    pub async fn create(&self, request: &RouteRequest) -> Result<Route, Error> {
        let start = self.resolve(&request.start).await?;
        let mut intermediates = Vec::with_capacity(request.intermediates.len());
        for fields in &request.intermediates {
            intermediates.push(self.resolve(fields).await?);
        }
        let end = self.resolve(&request.end).await?;

        let query = RoutingQuery {
            stops: std::iter::once(&start)
                .chain(&intermediates)
                .chain(std::iter::once(&end))
                .map(|address| address.coordinates)
                .collect(),
            avoid: request.avoid,
            optimize: true,
        };
        debug!(stops = query.stops.len(), "requesting route");

        let router = Arc::clone(&self.router);
        let legs = self
            .executor
            .execute(ROUTING_API, move |endpoint| {
                let router = Arc::clone(&router);
                let query = query.clone();
                async move { router.find_route(&endpoint, &query).await }
            })
            .await?;
        if legs.is_empty() {
            info!("routing api returned no legs");
            return Err(Error::not_routable());
        }

        self.assembler
            .assemble(&legs, &start, &intermediates, &end, request.avoid)
            .await
    }

    async fn resolve(&self, fields: &AddressFields) -> Result<Address, Error> {
        self.addresses
            .resolve_address(fields)
            .await
            .map_err(|error| error.context(ADDRESS_CONTEXT))
    }
}

#[async_trait]
impl RouteCreation for RouteOrchestrator {
    async fn create_route(&self, payload: &Value) -> Result<Route, Error> {
        let request = RouteRequest::from_json(payload)?;
        self.create(&request).await
    }
}
