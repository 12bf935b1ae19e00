//! PostgreSQL-backed `RouteRepository` implementation.
//!
//! Connections are upserted on their natural key (endpoints plus avoid
//! flags) so routes share them. A route and its steps are written in one
//! transaction; deleting either one removes the route and its steps but never
//! the connections or addresses they reference.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{RouteRepository, RouteRepositoryError};
use crate::domain::{
    Address, AddressConnection, AddressConnectionId, AvoidFlags, NewAddressConnection, Route,
    RouteDetails, RouteKey, RouteStep,
};

use super::diesel_address_repository::row_to_address;
use super::error_mapping::{map_basic_diesel_error, map_pool_error};
use super::models::{
    AddressConnectionRow, AddressRow, NewAddressConnectionRow, NewRouteRow, NewRouteStepRow,
    RouteRow,
};
use super::pool::DbPool;
use super::schema::{address_connections, addresses, route_address_connections, routes};

/// Diesel-backed implementation of the `RouteRepository` port.
#[derive(Clone)]
pub struct DieselRouteRepository {
    pool: DbPool,
}

impl DieselRouteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: DieselError) -> RouteRepositoryError {
    map_basic_diesel_error(
        error,
        RouteRepositoryError::query,
        RouteRepositoryError::connection,
    )
}

fn map_create_error(error: DieselError, key: &RouteKey) -> RouteRepositoryError {
    // Steps belong to a route inserted in the same transaction, so the only
    // reachable unique constraint is the route key.
    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            debug!(route_key = %key, "route key already taken");
            RouteRepositoryError::duplicate_key(key.as_ref())
        }
        _ => map_diesel_error(error),
    }
}

fn row_to_connection(row: AddressConnectionRow) -> AddressConnection {
    AddressConnection {
        id: row.id,
        from_address: row.from_address,
        to_address: row.to_address,
        avoid: AvoidFlags {
            avoid_highways: row.avoid_highways,
            avoid_tolls: row.avoid_tolls,
            avoid_ferries: row.avoid_ferries,
        },
        distance_meters: row.distance_meters,
        travel_seconds: row.travel_seconds,
    }
}

fn step_orders(count: usize) -> Result<Vec<i32>, RouteRepositoryError> {
    (0..count)
        .map(|order| {
            i32::try_from(order).map_err(|_| {
                RouteRepositoryError::query(format!("step order {order} exceeds the column range"))
            })
        })
        .collect()
}

/// Build the read model from a route row, its steps in order, and every
/// address those steps reference.
fn assemble_details(
    route: RouteRow,
    steps: Vec<(i32, AddressConnectionRow)>,
    addresses: &HashMap<i64, Address>,
) -> Result<RouteDetails, RouteRepositoryError> {
    let key = RouteKey::new(route.route_key.as_str()).map_err(|err| {
        RouteRepositoryError::query(format!("stored route key is invalid: {err}"))
    })?;
    let lookup = |id: i64| {
        addresses
            .get(&id)
            .cloned()
            .ok_or_else(|| RouteRepositoryError::query(format!("address {id} is missing")))
    };

    let mut avoid = None;
    let mut route_steps = Vec::with_capacity(steps.len());
    for (order, row) in steps {
        let connection = row_to_connection(row);
        avoid.get_or_insert(connection.avoid);
        let order = u32::try_from(order).map_err(|_| {
            RouteRepositoryError::query(format!("stored step order {order} is negative"))
        })?;
        route_steps.push(RouteStep {
            order,
            from: lookup(connection.from_address)?,
            to: lookup(connection.to_address)?,
            distance_meters: connection.distance_meters,
            travel_seconds: connection.travel_seconds,
        });
    }

    Ok(RouteDetails {
        key,
        created_at: route.created_at,
        avoid: avoid.unwrap_or_default(),
        steps: route_steps,
    })
}

#[async_trait]
impl RouteRepository for DieselRouteRepository {
    async fn upsert_connection(
        &self,
        connection: &NewAddressConnection,
    ) -> Result<AddressConnection, RouteRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RouteRepositoryError::connection))?;

        let new_row = NewAddressConnectionRow {
            from_address: connection.from_address,
            to_address: connection.to_address,
            avoid_highways: connection.avoid.avoid_highways,
            avoid_tolls: connection.avoid.avoid_tolls,
            avoid_ferries: connection.avoid.avoid_ferries,
            distance_meters: connection.distance_meters,
            travel_seconds: connection.travel_seconds,
        };

        let row = diesel::insert_into(address_connections::table)
            .values(&new_row)
            .on_conflict((
                address_connections::from_address,
                address_connections::to_address,
                address_connections::avoid_highways,
                address_connections::avoid_tolls,
                address_connections::avoid_ferries,
            ))
            .do_update()
            .set((
                address_connections::distance_meters
                    .eq(excluded(address_connections::distance_meters)),
                address_connections::travel_seconds
                    .eq(excluded(address_connections::travel_seconds)),
            ))
            .returning(AddressConnectionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_connection(row))
    }

    async fn create_route(
        &self,
        key: &RouteKey,
        connection_ids: &[AddressConnectionId],
        created_at: DateTime<Utc>,
    ) -> Result<Route, RouteRepositoryError> {
        let orders = step_orders(connection_ids.len())?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RouteRepositoryError::connection))?;

        let route_row = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    let route_row = diesel::insert_into(routes::table)
                        .values(&NewRouteRow {
                            route_key: key.as_ref(),
                            created_at,
                        })
                        .returning(RouteRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let step_rows: Vec<NewRouteStepRow> = connection_ids
                        .iter()
                        .zip(orders)
                        .map(|(&address_connection_id, step_order)| NewRouteStepRow {
                            route_id: route_row.id,
                            address_connection_id,
                            step_order,
                        })
                        .collect();
                    if !step_rows.is_empty() {
                        diesel::insert_into(route_address_connections::table)
                            .values(&step_rows)
                            .execute(conn)
                            .await?;
                    }
                    Ok(route_row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_create_error(err, key))?;

        Ok(Route {
            id: route_row.id,
            key: key.clone(),
            created_at: route_row.created_at,
            connection_ids: connection_ids.to_vec(),
        })
    }

    async fn find_by_key(
        &self,
        key: &RouteKey,
    ) -> Result<Option<RouteDetails>, RouteRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RouteRepositoryError::connection))?;

        let loaded = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, DieselError, _>(|conn| {
                async move {
                    let Some(route) = routes::table
                        .filter(routes::route_key.eq(key.as_ref()))
                        .select(RouteRow::as_select())
                        .first(conn)
                        .await
                        .optional()?
                    else {
                        return Ok(None);
                    };

                    let steps: Vec<(i32, AddressConnectionRow)> =
                        route_address_connections::table
                            .inner_join(address_connections::table)
                            .filter(route_address_connections::route_id.eq(route.id))
                            .order(route_address_connections::step_order.asc())
                            .select((
                                route_address_connections::step_order,
                                AddressConnectionRow::as_select(),
                            ))
                            .load(conn)
                            .await?;

                    let mut address_ids: Vec<i64> = steps
                        .iter()
                        .flat_map(|(_, row)| [row.from_address, row.to_address])
                        .collect();
                    address_ids.sort_unstable();
                    address_ids.dedup();

                    let address_rows: Vec<AddressRow> = addresses::table
                        .filter(addresses::id.eq_any(address_ids))
                        .select(AddressRow::as_select())
                        .load(conn)
                        .await?;

                    Ok(Some((route, steps, address_rows)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let Some((route, steps, address_rows)) = loaded else {
            return Ok(None);
        };
        let addresses: HashMap<i64, Address> = address_rows
            .into_iter()
            .map(|row| (row.id, row_to_address(row)))
            .collect();
        assemble_details(route, steps, &addresses).map(Some)
    }

    async fn delete_route(&self, key: &RouteKey) -> Result<bool, RouteRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RouteRepositoryError::connection))?;

        let deleted = diesel::delete(routes::table.filter(routes::route_key.eq(key.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn delete_route_step(
        &self,
        key: &RouteKey,
        order: u32,
    ) -> Result<bool, RouteRepositoryError> {
        let Ok(step_order) = i32::try_from(order) else {
            return Ok(false);
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RouteRepositoryError::connection))?;

        conn.transaction::<_, DieselError, _>(|conn| {
            async move {
                let owner: Option<i64> = diesel::delete(
                    route_address_connections::table
                        .filter(
                            route_address_connections::route_id.eq_any(
                                routes::table
                                    .filter(routes::route_key.eq(key.as_ref()))
                                    .select(routes::id),
                            ),
                        )
                        .filter(route_address_connections::step_order.eq(step_order)),
                )
                .returning(route_address_connections::route_id)
                .get_result(conn)
                .await
                .optional()?;

                let Some(route_id) = owner else {
                    return Ok(false);
                };
                diesel::delete(routes::table.filter(routes::id.eq(route_id)))
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
