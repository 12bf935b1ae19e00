//! Reconstruction and storage of routes from routing-service legs.
//!
//! The routing service may reorder intermediate stops, so legs are matched
//! back to stored addresses by proximity rather than by position. Matching is
//! greedy and follows the service's leg order: each leg consumes the unused
//! stop nearest its start point and looks up, without consuming, the stop
//! nearest its end point.
//!
//! Address connections are upserted one by one and survive any later
//! failure, since other routes may share them. The route and its ordered
//! steps are written in one repository call, which is atomic.

use std::sync::Arc;

use mockable::Clock;
use tracing::{error, info, warn};

use crate::domain::Error;
use crate::domain::persistence_mapping::map_route_error;
use crate::domain::ports::{RouteRepository, RouteRepositoryError};

use super::{
    Address, AddressConnectionId, AvoidFlags, Coordinates, NewAddressConnection, Route,
    RouteKeyGenerator, RouteLeg, geodesic_distance_m,
};

/// Number of fresh keys tried before a key collision becomes an error.
pub const MAX_ROUTE_KEY_ATTEMPTS: u32 = 8;

/// A routing leg paired with the stored addresses it runs between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedLeg<'a> {
    /// Address nearest the leg's start point.
    pub from: &'a Address,
    /// Address nearest the leg's end point.
    pub to: &'a Address,
    /// The leg as returned by the routing service.
    pub leg: &'a RouteLeg,
}

/// Pair every leg with its stored endpoints.
///
/// # Errors
/// Returns `reconciliation_failed` when there are no legs, when the stops run
/// out before the legs do, or when the first leg does not leave from `start`
/// or the last leg does not arrive at `end`.
pub fn match_legs<'a>(
    legs: &'a [RouteLeg],
    start: &'a Address,
    intermediates: &'a [Address],
    end: &'a Address,
) -> Result<Vec<MatchedLeg<'a>>, Error> {
    if legs.is_empty() {
        return Err(reconciliation_failure("the routing response contained no legs"));
    }

    let mut pool: Vec<&Address> = std::iter::once(start)
        .chain(intermediates)
        .chain(std::iter::once(end))
        .collect();
    let mut matched = Vec::with_capacity(legs.len());

    for (index, leg) in legs.iter().enumerate() {
        let (from_index, from) = nearest(&pool, leg.start_point).ok_or_else(|| {
            reconciliation_failure(format!("no unused stop left for the start of leg {index}"))
        })?;
        pool.remove(from_index);
        let (_, to) = nearest(&pool, leg.end_point).ok_or_else(|| {
            reconciliation_failure(format!("no unused stop left for the end of leg {index}"))
        })?;
        matched.push(MatchedLeg { from, to, leg });
    }

    let first_from = matched.first().map(|leg| leg.from.id);
    let last_to = matched.last().map(|leg| leg.to.id);
    if first_from != Some(start.id) {
        return Err(reconciliation_failure(
            "the first leg does not leave from the start address",
        ));
    }
    if last_to != Some(end.id) {
        return Err(reconciliation_failure(
            "the last leg does not arrive at the end address",
        ));
    }
    Ok(matched)
}

/// The address closest to `point` and its position; the earliest wins a tie.
fn nearest<'a>(pool: &[&'a Address], point: Coordinates) -> Option<(usize, &'a Address)> {
    let mut best: Option<(usize, &'a Address, f64)> = None;
    for (index, address) in pool.iter().copied().enumerate() {
        let distance = geodesic_distance_m(address.coordinates, point);
        if best.is_none_or(|(_, _, closest)| distance < closest) {
            best = Some((index, address, distance));
        }
    }
    best.map(|(index, address, _)| (index, address))
}

fn reconciliation_failure(message: impl Into<String>) -> Error {
    let message = message.into();
    error!(reason = %message, "route reconciliation failed");
    Error::reconciliation(message)
}

/// Stores routes reconstructed from routing legs.
pub struct RouteAssembler {
    routes: Arc<dyn RouteRepository>,
    keys: Arc<dyn RouteKeyGenerator>,
    clock: Arc<dyn Clock>,
}

impl RouteAssembler {
    /// Build an assembler.
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        keys: Arc<dyn RouteKeyGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            routes,
            keys,
            clock,
        }
    }

    /// Match `legs` to the given stops and store the resulting route.
    ///
    /// Nothing is written when matching fails.
    pub async fn assemble(
        &self,
        legs: &[RouteLeg],
        start: &Address,
        intermediates: &[Address],
        end: &Address,
        avoid: AvoidFlags,
    ) -> Result<Route, Error> {
        let matched = match_legs(legs, start, intermediates, end)?;

        let mut connection_ids: Vec<AddressConnectionId> = Vec::with_capacity(matched.len());
        for step in &matched {
            let connection = self
                .routes
                .upsert_connection(&NewAddressConnection {
                    from_address: step.from.id,
                    to_address: step.to.id,
                    avoid,
                    distance_meters: step.leg.distance_meters,
                    travel_seconds: step.leg.travel_seconds,
                })
                .await
                .map_err(map_route_error)?;
            connection_ids.push(connection.id);
        }

        self.store(&connection_ids).await
    }

    async fn store(&self, connection_ids: &[AddressConnectionId]) -> Result<Route, Error> {
        let created_at = self.clock.utc();
        for attempt in 1..=MAX_ROUTE_KEY_ATTEMPTS {
            let key = self.keys.generate();
            match self.routes.create_route(&key, connection_ids, created_at).await {
                Ok(route) => {
                    info!(
                        route_key = %route.key,
                        route_id = route.id,
                        steps = connection_ids.len(),
                        "route stored"
                    );
                    return Ok(route);
                }
                Err(RouteRepositoryError::DuplicateKey { route_key })
                    if attempt < MAX_ROUTE_KEY_ATTEMPTS =>
                {
                    warn!(%route_key, attempt, "route key collision; regenerating");
                }
                Err(err) => return Err(map_route_error(err)),
            }
        }

        Err(Error::internal(
            "unreachable route key control-flow state encountered",
        ))
    }
}

#[cfg(test)]
mod tests;
