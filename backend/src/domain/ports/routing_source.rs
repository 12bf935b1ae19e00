//! Driven port for the external routing and stop-optimisation API.

use async_trait::async_trait;

use crate::domain::{AvoidFlags, Coordinates, RouteLeg};

use super::{ApiEndpoint, ExternalCallError};

/// Domain-owned routing request passed to the routing adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingQuery {
    /// Stops in request order: start, intermediates, end.
    pub stops: Vec<Coordinates>,
    /// Routing options.
    pub avoid: AvoidFlags,
    /// Whether the API may reorder intermediate stops.
    pub optimize: bool,
}

impl RoutingQuery {
    /// Stops rendered as `lat,lng;lat,lng;...`.
    pub fn stops_param(&self) -> String {
        self.stops
            .iter()
            .map(Coordinates::to_stop)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Port for the external routing API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutingSource: Send + Sync {
    /// Compute legs for `query`.
    ///
    /// An answer with no legs is reported as
    /// [`ExternalCallError::NotRoutable`], never as an empty list.
    async fn find_route(
        &self,
        endpoint: &ApiEndpoint,
        query: &RoutingQuery,
    ) -> Result<Vec<RouteLeg>, ExternalCallError>;
}

/// Fixture implementation returning direct legs between consecutive stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureRoutingSource;

#[async_trait]
impl RoutingSource for FixtureRoutingSource {
    async fn find_route(
        &self,
        _endpoint: &ApiEndpoint,
        query: &RoutingQuery,
    ) -> Result<Vec<RouteLeg>, ExternalCallError> {
        let legs: Vec<RouteLeg> = query
            .stops
            .iter()
            .zip(query.stops.iter().skip(1))
            .map(|(&start_point, &end_point)| RouteLeg {
                start_point,
                end_point,
                distance_meters: 0,
                travel_seconds: 0,
            })
            .collect();
        if legs.is_empty() {
            return Err(ExternalCallError::not_routable());
        }
        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn renders_stops_parameter() {
        let query = RoutingQuery {
            stops: vec![Coordinates::new(39.78, -89.65), Coordinates::new(41.5, -87.25)],
            avoid: AvoidFlags::default(),
            optimize: true,
        };
        assert_eq!(query.stops_param(), "39.78,-89.65;41.5,-87.25");
    }
}
