//! Read access to stored routes by public key.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::Error;
use crate::domain::persistence_mapping::map_route_error;
use crate::domain::ports::{RouteLookup, RouteRepository};

use super::{RouteDetails, RouteKey};

/// Looks up routes for the presentation layer.
pub struct RouteQuery {
    routes: Arc<dyn RouteRepository>,
}

impl RouteQuery {
    /// Build a query service over `routes`.
    pub fn new(routes: Arc<dyn RouteRepository>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl RouteLookup for RouteQuery {
    async fn find_route(&self, route_key: &str) -> Result<RouteDetails, Error> {
        let not_found = || Error::not_found(format!("route {route_key} not found"));
        let Ok(key) = route_key.parse::<RouteKey>() else {
            debug!(route_key, "rejected malformed route key");
            return Err(not_found());
        };
        self.routes
            .find_by_key(&key)
            .await
            .map_err(map_route_error)?
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockRouteRepository, RouteRepositoryError};
    use crate::domain::{AvoidFlags, ErrorCode};
    use chrono::DateTime;
    use rstest::rstest;

    const KEY: &str = "AbCdEfGh12345678";

    fn details() -> RouteDetails {
        RouteDetails {
            key: RouteKey::new(KEY).expect("valid key"),
            created_at: DateTime::UNIX_EPOCH,
            avoid: AvoidFlags::default(),
            steps: Vec::new(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn returns_stored_route() {
        let mut routes = MockRouteRepository::new();
        routes
            .expect_find_by_key()
            .withf(|key| key.to_string() == KEY)
            .returning(|_| Ok(Some(details())));

        let found = RouteQuery::new(Arc::new(routes))
            .find_route(KEY)
            .await
            .expect("found");
        assert_eq!(found, details());
    }

    #[rstest]
    #[case("short")]
    #[case("has-punctuation!")]
    #[case("")]
    #[tokio::test]
    async fn malformed_keys_are_not_found_without_a_lookup(#[case] key: &str) {
        let mut routes = MockRouteRepository::new();
        routes.expect_find_by_key().never();

        let error = RouteQuery::new(Arc::new(routes))
            .find_route(key)
            .await
            .expect_err("malformed");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let mut routes = MockRouteRepository::new();
        routes.expect_find_by_key().returning(|_| Ok(None));

        let error = RouteQuery::new(Arc::new(routes))
            .find_route(KEY)
            .await
            .expect_err("unknown");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn store_outage_is_unavailable() {
        let mut routes = MockRouteRepository::new();
        routes
            .expect_find_by_key()
            .returning(|_| Err(RouteRepositoryError::connection("refused")));

        let error = RouteQuery::new(Arc::new(routes))
            .find_route(KEY)
            .await
            .expect_err("outage");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
