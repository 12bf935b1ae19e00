//! Leg matching and route storage.

use super::*;
use crate::domain::{AddressKey, ErrorCode, MockRouteKeyGenerator, RouteKey};
use crate::test_support::{
    InMemoryAddressRepository, InMemoryRouteRepository, MutableClock, SequenceRouteKeyGenerator,
};
use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid time")
}

fn key(text: &str) -> RouteKey {
    RouteKey::new(text).expect("valid route key")
}

fn leg(from: Coordinates, to: Coordinates, distance_meters: i64) -> RouteLeg {
    RouteLeg {
        start_point: from,
        end_point: to,
        distance_meters,
        travel_seconds: distance_meters / 10,
    }
}

/// Nudge a coordinate the way a routing service snaps stops to roads.
fn snapped(coordinates: Coordinates) -> Coordinates {
    Coordinates::new(coordinates.latitude + 0.0004, coordinates.longitude - 0.0003)
}

struct Stops {
    start: Address,
    first: Address,
    second: Address,
    end: Address,
}

impl Stops {
    fn intermediates(&self) -> Vec<Address> {
        vec![self.first.clone(), self.second.clone()]
    }
}

struct Harness {
    routes: Arc<InMemoryRouteRepository>,
    stops: Stops,
}

impl Harness {
    fn assembler(&self, keys: Arc<dyn RouteKeyGenerator>) -> RouteAssembler {
        RouteAssembler::new(self.routes.clone(), keys, Arc::new(MutableClock::new(now())))
    }
}

#[fixture]
fn harness() -> Harness {
    let addresses = Arc::new(InMemoryAddressRepository::default());
    let place = |street: &str, latitude: f64, longitude: f64| {
        addresses.insert(
            AddressKey::new(street, "Springfield", "IL", "62701", "USA"),
            Coordinates::new(latitude, longitude),
            now(),
        )
    };
    let stops = Stops {
        start: place("1 Start St", 39.78, -89.65),
        first: place("2 First Ave", 39.80, -89.60),
        second: place("3 Second Blvd", 39.75, -89.55),
        end: place("4 End Rd", 39.70, -89.70),
    };
    Harness {
        routes: Arc::new(InMemoryRouteRepository::new(addresses)),
        stops,
    }
}

#[rstest]
fn matches_legs_in_submitted_order(harness: Harness) {
    let Stops {
        start,
        first,
        second,
        end,
    } = &harness.stops;
    let intermediates = harness.stops.intermediates();
    let legs = vec![
        leg(snapped(start.coordinates), snapped(first.coordinates), 4_000),
        leg(snapped(first.coordinates), snapped(second.coordinates), 5_000),
        leg(snapped(second.coordinates), snapped(end.coordinates), 6_000),
    ];

    let matched = match_legs(&legs, start, &intermediates, end).expect("matched");

    let pairs: Vec<(i64, i64)> = matched.iter().map(|m| (m.from.id, m.to.id)).collect();
    assert_eq!(
        pairs,
        vec![(start.id, first.id), (first.id, second.id), (second.id, end.id)]
    );
}

#[rstest]
fn follows_optimised_reordering(harness: Harness) {
    let Stops {
        start,
        first,
        second,
        end,
    } = &harness.stops;
    let intermediates = harness.stops.intermediates();
    let legs = vec![
        leg(snapped(start.coordinates), snapped(second.coordinates), 4_000),
        leg(snapped(second.coordinates), snapped(first.coordinates), 5_000),
        leg(snapped(first.coordinates), snapped(end.coordinates), 6_000),
    ];

    let matched = match_legs(&legs, start, &intermediates, end).expect("matched");

    let pairs: Vec<(i64, i64)> = matched.iter().map(|m| (m.from.id, m.to.id)).collect();
    assert_eq!(
        pairs,
        vec![(start.id, second.id), (second.id, first.id), (first.id, end.id)]
    );
    assert_eq!(matched[1].leg.distance_meters, 5_000);
}

#[rstest]
fn round_trip_returns_to_the_start(harness: Harness) {
    let start = &harness.stops.start;
    let first = &harness.stops.first;
    let intermediates = vec![first.clone()];
    let legs = vec![
        leg(start.coordinates, first.coordinates, 1_000),
        leg(first.coordinates, start.coordinates, 1_000),
    ];

    let matched = match_legs(&legs, start, &intermediates, start).expect("matched");

    assert_eq!(matched[0].from.id, start.id);
    assert_eq!(matched[1].to.id, start.id);
}

#[rstest]
fn empty_leg_list_is_a_reconciliation_failure(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;

    let error = match_legs(&[], start, &[], end).expect_err("no legs");
    assert_eq!(error.code(), ErrorCode::ReconciliationFailed);
}

#[rstest]
fn wrong_first_origin_is_a_reconciliation_failure(harness: Harness) {
    let Stops {
        start,
        first,
        second,
        end,
    } = &harness.stops;
    let intermediates = harness.stops.intermediates();
    let legs = vec![
        leg(first.coordinates, start.coordinates, 1_000),
        leg(start.coordinates, second.coordinates, 1_000),
        leg(second.coordinates, end.coordinates, 1_000),
    ];

    let error = match_legs(&legs, start, &intermediates, end).expect_err("mismatch");
    assert_eq!(error.code(), ErrorCode::ReconciliationFailed);
    assert!(error.message().contains("first leg"));
}

#[rstest]
fn wrong_final_destination_is_a_reconciliation_failure(harness: Harness) {
    let Stops {
        start, first, end, ..
    } = &harness.stops;
    let intermediates = vec![first.clone()];
    let legs = vec![leg(start.coordinates, first.coordinates, 1_000)];

    let error = match_legs(&legs, start, &intermediates, end).expect_err("mismatch");
    assert!(error.message().contains("last leg"));
}

#[rstest]
fn more_legs_than_stops_exhausts_the_pool(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;
    let legs = vec![
        leg(start.coordinates, end.coordinates, 1_000),
        leg(end.coordinates, start.coordinates, 1_000),
    ];

    let error = match_legs(&legs, start, &[], end).expect_err("exhausted");
    assert_eq!(error.code(), ErrorCode::ReconciliationFailed);
    assert!(error.message().contains("no unused stop"));
}

#[rstest]
fn ties_go_to_the_earliest_stop(harness: Harness) {
    let mut twin = harness.stops.first.clone();
    twin.id = 99;
    let pool = vec![&harness.stops.first, &twin];

    assert_eq!(
        nearest(&pool, harness.stops.first.coordinates).map(|(index, _)| index),
        Some(0)
    );
    assert_eq!(nearest(&[], harness.stops.first.coordinates), None);
}

#[rstest]
#[tokio::test]
async fn stores_connections_and_ordered_steps(harness: Harness) {
    let Stops {
        start,
        first,
        second,
        end,
    } = &harness.stops;
    let legs = vec![
        leg(start.coordinates, second.coordinates, 4_000),
        leg(second.coordinates, first.coordinates, 5_000),
        leg(first.coordinates, end.coordinates, 6_000),
    ];
    let assembler = harness.assembler(Arc::new(SequenceRouteKeyGenerator::new([key(
        "RouteKey00000001",
    )])));

    let route = assembler
        .assemble(
            &legs,
            start,
            &harness.stops.intermediates(),
            end,
            AvoidFlags::default(),
        )
        .await
        .expect("stored");

    assert_eq!(route.key, key("RouteKey00000001"));
    assert_eq!(route.created_at, now());
    assert_eq!(route.connection_ids.len(), 3);

    let details = harness
        .routes
        .find_by_key(&route.key)
        .await
        .expect("query")
        .expect("route exists");
    let visited: Vec<i64> = details.steps.iter().map(|step| step.to.id).collect();
    assert_eq!(visited, vec![second.id, first.id, end.id]);
    assert_eq!(details.steps[2].distance_meters, 6_000);
    assert_eq!(details.avoid, AvoidFlags::default());
}

#[rstest]
#[tokio::test]
async fn shared_connections_are_refreshed_not_duplicated(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;
    let assembler = harness.assembler(Arc::new(SequenceRouteKeyGenerator::default()));
    let avoid = AvoidFlags::default();

    let first = assembler
        .assemble(&[leg(start.coordinates, end.coordinates, 1_000)], start, &[], end, avoid)
        .await
        .expect("first");
    let second = assembler
        .assemble(&[leg(start.coordinates, end.coordinates, 1_200)], start, &[], end, avoid)
        .await
        .expect("second");

    assert_eq!(first.connection_ids, second.connection_ids);
    assert_ne!(first.key, second.key);
    let connections = harness.routes.connections();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].distance_meters, 1_200);
}

#[rstest]
#[tokio::test]
async fn different_avoid_flags_get_their_own_connection(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;
    let assembler = harness.assembler(Arc::new(SequenceRouteKeyGenerator::default()));
    let legs = [leg(start.coordinates, end.coordinates, 1_000)];
    let tolls = AvoidFlags {
        avoid_tolls: true,
        ..AvoidFlags::default()
    };

    assembler
        .assemble(&legs, start, &[], end, AvoidFlags::default())
        .await
        .expect("default flags");
    assembler
        .assemble(&legs, start, &[], end, tolls)
        .await
        .expect("avoid tolls");

    assert_eq!(harness.routes.connections().len(), 2);
}

#[rstest]
#[tokio::test]
async fn mismatch_writes_nothing(harness: Harness) {
    let Stops {
        start, first, end, ..
    } = &harness.stops;
    let assembler = harness.assembler(Arc::new(SequenceRouteKeyGenerator::default()));

    let error = assembler
        .assemble(
            &[leg(start.coordinates, first.coordinates, 1_000)],
            start,
            &[first.clone()],
            end,
            AvoidFlags::default(),
        )
        .await
        .expect_err("mismatch");

    assert_eq!(error.code(), ErrorCode::ReconciliationFailed);
    assert!(harness.routes.connections().is_empty());
    assert!(harness.routes.routes().is_empty());
}

#[rstest]
#[tokio::test]
async fn key_collision_is_retried_with_a_fresh_key(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;
    let taken = key("TakenTakenTaken1");
    let assembler = harness.assembler(Arc::new(SequenceRouteKeyGenerator::new([
        taken.clone(),
        taken.clone(),
        key("FreshFreshFresh2"),
    ])));
    let legs = [leg(start.coordinates, end.coordinates, 1_000)];

    assembler
        .assemble(&legs, start, &[], end, AvoidFlags::default())
        .await
        .expect("first route");
    let second = assembler
        .assemble(&legs, start, &[], end, AvoidFlags::default())
        .await
        .expect("second route");

    assert_eq!(second.key, key("FreshFreshFresh2"));
    assert_eq!(harness.routes.routes().len(), 2);
}

#[rstest]
#[tokio::test]
async fn persistent_collisions_give_up(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;
    let mut keys = MockRouteKeyGenerator::new();
    keys.expect_generate()
        .times(1 + MAX_ROUTE_KEY_ATTEMPTS as usize)
        .returning(|| key("AlwaysTheSameKey"));
    let assembler = harness.assembler(Arc::new(keys));
    let legs = [leg(start.coordinates, end.coordinates, 1_000)];

    assembler
        .assemble(&legs, start, &[], end, AvoidFlags::default())
        .await
        .expect("first route");
    let error = assembler
        .assemble(&legs, start, &[], end, AvoidFlags::default())
        .await
        .expect_err("collides every time");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(harness.routes.routes().len(), 1);
}

#[rstest]
#[tokio::test]
async fn failed_route_write_keeps_connections(harness: Harness) {
    let Stops { start, end, .. } = &harness.stops;
    harness
        .routes
        .fail_next_create(RouteRepositoryError::connection("pool exhausted"));
    let assembler = harness.assembler(Arc::new(SequenceRouteKeyGenerator::default()));

    let error = assembler
        .assemble(
            &[leg(start.coordinates, end.coordinates, 1_000)],
            start,
            &[],
            end,
            AvoidFlags::default(),
        )
        .await
        .expect_err("store unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(harness.routes.connections().len(), 1);
    assert!(harness.routes.routes().is_empty());
}
