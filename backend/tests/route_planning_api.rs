//! End-to-end checks of the HTTP surface over in-memory adapters.
//!
//! The real domain services (resolver, throttle, retry executor, assembler,
//! orchestrator, and read model) are wired exactly as the server wires them;
//! only the database and the RapidAPI clients are replaced by the
//! `test-support` doubles.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use route_planner::Trace;
use route_planner::domain::ports::{AddressGeolocation, ExternalCallError, RouteRepository};
use route_planner::domain::{
    AddressResolver, ApiConfig, ApiRequestStatus, Coordinates, GEOLOCATE_API,
    GEOLOCATION_UNAVAILABLE, ROUTING_API, RequestThrottle, RetryExecutor, RouteAssembler,
    RouteKey, RouteOrchestrator, RouteQuery, StartupMaintenance, ThrottleConfig,
};
use route_planner::inbound::http::geolocate::geolocate;
use route_planner::inbound::http::json_config;
use route_planner::inbound::http::routes::{create_route, get_route};
use route_planner::inbound::http::state::HttpState;
use route_planner::test_support::{
    ImmediateSleeper, InMemoryAddressRepository, InMemoryApiConfigRepository,
    InMemoryApiRequestRepository, InMemoryRouteRepository, MutableClock, ScriptedGeocodingSource,
    ScriptedRoutingSource, SequenceRouteKeyGenerator,
};

const FIRST_KEY: &str = "RouteKeyAAAAAAA1";
const SECOND_KEY: &str = "RouteKeyAAAAAAA2";

fn started_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn api(name: &str) -> ApiConfig {
    ApiConfig {
        name: name.to_owned(),
        base_url: format!("https://{}.invalid/", name.to_lowercase()),
        credential: "key".to_owned(),
        request_delay_seconds: 0.0,
        max_attempts: 2,
    }
}

fn address(street: &str) -> Value {
    json!({
        "street": street,
        "city": "Springfield",
        "state": "IL",
        "postal_code": "62701",
        "country": "USA",
    })
}

fn query_for(street: &str) -> String {
    format!("{}, SPRINGFIELD, IL, USA 62701", street.to_uppercase())
}

struct World {
    state: HttpState,
    clock: Arc<MutableClock>,
    geocoder: Arc<ScriptedGeocodingSource>,
    router: Arc<ScriptedRoutingSource>,
    requests: Arc<InMemoryApiRequestRepository>,
    routes: Arc<InMemoryRouteRepository>,
    apis: Arc<InMemoryApiConfigRepository>,
}

#[fixture]
fn world() -> World {
    let clock = Arc::new(MutableClock::new(started_at()));
    let sleeper = Arc::new(ImmediateSleeper);
    let apis = Arc::new(InMemoryApiConfigRepository::with_apis([
        api(GEOLOCATE_API),
        api(ROUTING_API),
    ]));
    let requests = Arc::new(InMemoryApiRequestRepository::default());
    let addresses = Arc::new(InMemoryAddressRepository::default());
    let routes = Arc::new(InMemoryRouteRepository::new(addresses.clone()));
    let geocoder = Arc::new(
        ScriptedGeocodingSource::default()
            .with_location(query_for("1 First St"), Coordinates::new(39.78, -89.65))
            .with_location(query_for("2 Second St"), Coordinates::new(39.80, -89.60))
            .with_location(query_for("3 Third St"), Coordinates::new(39.70, -89.70)),
    );
    let router = Arc::new(ScriptedRoutingSource::default());

    let throttle = Arc::new(RequestThrottle::new(
        requests.clone(),
        clock.clone(),
        sleeper.clone(),
        ThrottleConfig::default(),
    ));
    let executor = RetryExecutor::new(apis.clone(), throttle, sleeper);
    let geolocation: Arc<dyn AddressGeolocation> = Arc::new(AddressResolver::new(
        addresses,
        geocoder.clone(),
        executor.clone(),
        clock.clone(),
    ));
    let route_store: Arc<dyn RouteRepository> = routes.clone();
    let assembler = RouteAssembler::new(
        route_store.clone(),
        Arc::new(SequenceRouteKeyGenerator::new([
            RouteKey::new(FIRST_KEY).expect("valid key"),
            RouteKey::new(SECOND_KEY).expect("valid key"),
        ])),
        clock.clone(),
    );
    let orchestrator =
        RouteOrchestrator::new(geolocation.clone(), router.clone(), executor, assembler);

    World {
        state: HttpState::new(
            geolocation,
            Arc::new(orchestrator),
            Arc::new(RouteQuery::new(route_store)),
            clock.clone(),
        ),
        clock,
        geocoder,
        router,
        requests,
        routes,
        apis,
    }
}

fn build_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().wrap(Trace).app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .app_data(json_config())
            .service(geolocate)
            .service(create_route)
            .service(get_route),
    )
}

fn route_payload() -> Value {
    json!({
        "start_address": address("1 First St"),
        "intermediate_addresses": [address("2 Second St")],
        "end_address": address("3 Third St"),
        "avoid_tolls": true,
    })
}

#[rstest]
#[actix_web::test]
async fn creates_and_reads_back_a_route(world: World) {
    let service = test::init_service(build_app(world.state)).await;

    let created = test::call_service(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/routes")
            .set_json(route_payload())
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(created).await;
    assert_eq!(body["routeKey"], FIRST_KEY);
    assert_eq!(body["routeUrl"], format!("/routes/{FIRST_KEY}"));

    world.clock.advance_days(2);
    let fetched = test::call_service(
        &service,
        test::TestRequest::get()
            .uri(&format!("/api/v1/routes/{FIRST_KEY}"))
            .to_request(),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let view: Value = test::read_body_json(fetched).await;
    assert_eq!(view["key"], FIRST_KEY);
    assert_eq!(view["daysSinceCreation"], 2);
    assert_eq!(view["avoid"]["avoidTolls"], true);
    assert_eq!(view["avoid"]["avoidFerries"], true);
    let steps = view["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["from"]["lineOne"], "1 First St");
    assert_eq!(steps[1]["to"]["lineOne"], "3 Third St");
    assert_eq!(view["totals"]["distanceKm"], 2.0);
    assert_eq!(view["totals"]["travelSeconds"], 120);

    assert_eq!(world.geocoder.calls().len(), 3);
    assert_eq!(world.router.calls().len(), 1);
    assert!(world.router.calls()[0].avoid.avoid_tolls);
    assert_eq!(world.requests.waiting_count(), 0);
    assert!(
        world
            .requests
            .records()
            .iter()
            .all(|record| record.status == ApiRequestStatus::Finished)
    );
}

#[rstest]
#[actix_web::test]
async fn repeated_requests_reuse_cached_addresses_and_connections(world: World) {
    let service = test::init_service(build_app(world.state)).await;

    for expected_key in [FIRST_KEY, SECOND_KEY] {
        let res = test::call_service(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/routes")
                .set_json(route_payload())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["routeKey"], expected_key);
    }

    assert_eq!(world.geocoder.calls().len(), 3);
    assert_eq!(world.router.calls().len(), 2);
    assert_eq!(world.routes.routes().len(), 2);
    assert_eq!(world.routes.connections().len(), 2);
}

#[rstest]
#[actix_web::test]
async fn geolocate_returns_stored_coordinates(world: World) {
    let service = test::init_service(build_app(world.state)).await;

    let res = test::call_service(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/geolocate")
            .set_json(address("2 Second St"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["lat"], 39.80);
    assert_eq!(body["lng"], -89.60);
}

#[rstest]
#[actix_web::test]
async fn unroutable_requests_store_nothing(world: World) {
    world
        .router
        .push_outcome(Err(ExternalCallError::not_routable()));
    let service = test::init_service(build_app(world.state)).await;

    let res = test::call_service(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/routes")
            .set_json(route_payload())
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "not_routable");
    assert!(world.routes.routes().is_empty());
    assert_eq!(world.router.calls().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn geocoding_outages_surface_as_unavailable(world: World) {
    let service = test::init_service(build_app(world.state)).await;
    let payload = json!({
        "start_address": address("1 First St"),
        "end_address": address("404 Nowhere Ln"),
    });

    let res = test::call_service(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/routes")
            .set_json(payload)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "service_unavailable");
    assert_eq!(
        body["message"],
        format!("Could not parse address data: {GEOLOCATION_UNAVAILABLE}")
    );
    assert_eq!(
        world
            .geocoder
            .calls()
            .iter()
            .filter(|query| query.starts_with("404 NOWHERE LN"))
            .count(),
        2
    );
    assert!(world.router.calls().is_empty());
    assert_eq!(world.requests.waiting_count(), 0);
}

#[rstest]
#[actix_web::test]
async fn incomplete_addresses_are_rejected_before_any_call(world: World) {
    let service = test::init_service(build_app(world.state)).await;
    let payload = json!({
        "start_address": address("1 First St"),
        "end_address": { "street": "3 Third St", "city": "Springfield" },
    });

    let res = test::call_service(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/routes")
            .set_json(payload)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().contains_key("trace-id"));
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert!(world.geocoder.calls().is_empty());
    assert!(world.router.calls().is_empty());
}

#[rstest]
#[actix_web::test]
async fn unknown_route_keys_are_not_found(world: World) {
    let service = test::init_service(build_app(world.state)).await;

    let res = test::call_service(
        &service,
        test::TestRequest::get()
            .uri("/api/v1/routes/NoSuchRouteKey00")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn startup_maintenance_clears_stale_queue_entries(world: World) {
    world
        .requests
        .seed(ROUTING_API, ApiRequestStatus::Waiting);
    world
        .requests
        .seed(GEOLOCATE_API, ApiRequestStatus::Finished);
    let maintenance = StartupMaintenance::new(
        world.apis.clone(),
        world.requests.clone(),
        vec![api(GEOLOCATE_API), api("Elevation")],
    );

    let report = maintenance.run().await.expect("maintenance succeeds");

    assert_eq!(report.apis_created, 1);
    assert_eq!(report.requests_failed, 1);
    assert_eq!(world.requests.waiting_count(), 0);
    assert_eq!(world.apis.all().len(), 3);
}
