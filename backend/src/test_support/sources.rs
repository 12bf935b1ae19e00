//! Scripted outbound sources and deterministic key generation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{
    ApiEndpoint, ExternalCallError, GeocodingSource, RoutingQuery, RoutingSource,
};
use crate::domain::{Coordinates, RouteKey, RouteKeyGenerator, RouteLeg};

use super::lock;

/// Geocoder answering from a fixed table of queries.
///
/// Queued failures are returned, in order, before any table lookup. Unknown
/// queries decode-fail.
#[derive(Default)]
pub struct ScriptedGeocodingSource {
    locations: Mutex<HashMap<String, Coordinates>>,
    failures: Mutex<VecDeque<ExternalCallError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGeocodingSource {
    /// Answer `query` with `coordinates`.
    pub fn with_location(self, query: impl Into<String>, coordinates: Coordinates) -> Self {
        lock(&self.locations).insert(query.into(), coordinates);
        self
    }

    /// Fail the next call with `error`.
    pub fn push_failure(&self, error: ExternalCallError) {
        lock(&self.failures).push_back(error);
    }

    /// Queries received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl GeocodingSource for ScriptedGeocodingSource {
    async fn geocode(
        &self,
        _endpoint: &ApiEndpoint,
        query: &str,
    ) -> Result<Coordinates, ExternalCallError> {
        lock(&self.calls).push(query.to_owned());
        if let Some(error) = lock(&self.failures).pop_front() {
            return Err(error);
        }
        lock(&self.locations)
            .get(query)
            .copied()
            .ok_or_else(|| ExternalCallError::decode(format!("no results for {query}")))
    }
}

/// Router replaying queued outcomes.
///
/// Once the queue is empty it answers with direct legs between consecutive
/// stops, 1 km and 60 s each.
#[derive(Default)]
pub struct ScriptedRoutingSource {
    outcomes: Mutex<VecDeque<Result<Vec<RouteLeg>, ExternalCallError>>>,
    calls: Mutex<Vec<RoutingQuery>>,
}

impl ScriptedRoutingSource {
    /// Queue the outcome of the next call.
    pub fn push_outcome(&self, outcome: Result<Vec<RouteLeg>, ExternalCallError>) {
        lock(&self.outcomes).push_back(outcome);
    }

    /// Queries received so far, in call order.
    pub fn calls(&self) -> Vec<RoutingQuery> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RoutingSource for ScriptedRoutingSource {
    async fn find_route(
        &self,
        _endpoint: &ApiEndpoint,
        query: &RoutingQuery,
    ) -> Result<Vec<RouteLeg>, ExternalCallError> {
        lock(&self.calls).push(query.clone());
        if let Some(outcome) = lock(&self.outcomes).pop_front() {
            return outcome;
        }
        Ok(query
            .stops
            .iter()
            .zip(query.stops.iter().skip(1))
            .map(|(&start_point, &end_point)| RouteLeg {
                start_point,
                end_point,
                distance_meters: 1_000,
                travel_seconds: 60,
            })
            .collect())
    }
}

/// Key generator replaying fixed keys, then falling back to random ones.
#[derive(Default)]
pub struct SequenceRouteKeyGenerator(Mutex<VecDeque<RouteKey>>);

impl SequenceRouteKeyGenerator {
    /// Generator yielding `keys` first.
    pub fn new(keys: impl IntoIterator<Item = RouteKey>) -> Self {
        Self(Mutex::new(keys.into_iter().collect()))
    }
}

impl RouteKeyGenerator for SequenceRouteKeyGenerator {
    fn generate(&self) -> RouteKey {
        lock(&self.0)
            .pop_front()
            .unwrap_or_else(|| RouteKey::random(&mut rand::thread_rng()))
    }
}
