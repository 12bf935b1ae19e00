//! Wiring of domain services onto the Diesel and RapidAPI adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::warn;

use route_planner::domain::ports::{
    AddressGeolocation, AddressRepository, ApiConfigRepository, ApiRequestRepository,
    GeocodingSource, RouteRepository, RoutingSource,
};
use route_planner::domain::{
    AddressResolver, RandomRouteKeyGenerator, RequestThrottle, RetryExecutor, RouteAssembler,
    RouteOrchestrator, RouteQuery, Sleeper, ThrottleConfig, TokioSleeper,
};
use route_planner::inbound::http::state::HttpState;
use route_planner::outbound::persistence::{
    DbPool, DieselAddressRepository, DieselApiConfigRepository, DieselApiRequestRepository,
    DieselRouteRepository,
};
use route_planner::outbound::rapidapi::{
    RapidApiClient, RapidApiGeocodingSource, RapidApiRoutingSource,
};

use super::ServerConfig;

/// Build the handler state, falling back to fixtures when no pool is
/// configured.
///
/// # Errors
/// Returns [`std::io::Error`] when the outbound HTTP client cannot be built.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<HttpState> {
    match &config.db_pool {
        Some(pool) => build_live_state(pool, config.throttle),
        None => {
            warn!("no database pool configured; serving fixture responses");
            Ok(HttpState::default())
        }
    }
}

fn build_live_state(pool: &DbPool, throttle: ThrottleConfig) -> std::io::Result<HttpState> {
    let client = RapidApiClient::new()
        .map_err(|e| std::io::Error::other(format!("http client setup failed: {e}")))?;
    let geocoder: Arc<dyn GeocodingSource> =
        Arc::new(RapidApiGeocodingSource::new(client.clone()));
    let router: Arc<dyn RoutingSource> = Arc::new(RapidApiRoutingSource::new(client));

    let apis: Arc<dyn ApiConfigRepository> =
        Arc::new(DieselApiConfigRepository::new(pool.clone()));
    let requests: Arc<dyn ApiRequestRepository> =
        Arc::new(DieselApiRequestRepository::new(pool.clone()));
    let addresses: Arc<dyn AddressRepository> =
        Arc::new(DieselAddressRepository::new(pool.clone()));
    let routes: Arc<dyn RouteRepository> = Arc::new(DieselRouteRepository::new(pool.clone()));

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

    let throttle = Arc::new(RequestThrottle::new(
        requests,
        clock.clone(),
        sleeper.clone(),
        throttle,
    ));
    let executor = RetryExecutor::new(apis, throttle, sleeper);

    let resolver = Arc::new(AddressResolver::new(
        addresses,
        geocoder,
        executor.clone(),
        clock.clone(),
    ));
    let geolocation: Arc<dyn AddressGeolocation> = resolver;
    let assembler = RouteAssembler::new(
        routes.clone(),
        Arc::new(RandomRouteKeyGenerator),
        clock.clone(),
    );
    let orchestrator = RouteOrchestrator::new(geolocation.clone(), router, executor, assembler);

    Ok(HttpState::new(
        geolocation,
        Arc::new(orchestrator),
        Arc::new(RouteQuery::new(routes)),
        clock,
    ))
}
