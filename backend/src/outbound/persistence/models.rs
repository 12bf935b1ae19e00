//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{
    address_connections, addresses, api_requests, apis, route_address_connections, routes,
};

// ---------------------------------------------------------------------------
// API configuration and request queue
// ---------------------------------------------------------------------------

/// Row struct for reading from the apis table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = apis)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ApiRow {
    pub name: String,
    pub base_url: String,
    pub credential: String,
    pub request_delay_seconds: f64,
    pub max_attempts: i32,
}

/// Insertable struct for seeding API rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = apis)]
pub(crate) struct NewApiRow<'a> {
    pub name: &'a str,
    pub base_url: &'a str,
    pub credential: &'a str,
    pub request_delay_seconds: f64,
    pub max_attempts: i32,
}

/// Row struct for reading from the api_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = api_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ApiRequestRow {
    pub id: i64,
    pub api_name: String,
    pub requested_at: DateTime<Utc>,
    pub status: String,
}

/// Insertable struct for new queue entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_requests)]
pub(crate) struct NewApiRequestRow<'a> {
    pub api_name: &'a str,
    pub requested_at: DateTime<Utc>,
    pub status: &'a str,
}

// ---------------------------------------------------------------------------
// Addresses and connections
// ---------------------------------------------------------------------------

/// Row struct for reading from the addresses table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AddressRow {
    pub id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for address upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = addresses)]
pub(crate) struct NewAddressRow<'a> {
    pub street: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub country: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the address_connections table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = address_connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AddressConnectionRow {
    pub id: i64,
    pub from_address: i64,
    pub to_address: i64,
    pub avoid_highways: bool,
    pub avoid_tolls: bool,
    pub avoid_ferries: bool,
    pub distance_meters: i64,
    pub travel_seconds: i64,
}

/// Insertable struct for connection upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = address_connections)]
pub(crate) struct NewAddressConnectionRow {
    pub from_address: i64,
    pub to_address: i64,
    pub avoid_highways: bool,
    pub avoid_tolls: bool,
    pub avoid_ferries: bool,
    pub distance_meters: i64,
    pub travel_seconds: i64,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Row struct for reading from the routes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RouteRow {
    pub id: i64,
    pub route_key: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new routes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routes)]
pub(crate) struct NewRouteRow<'a> {
    pub route_key: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for route steps.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = route_address_connections)]
pub(crate) struct NewRouteStepRow {
    pub route_id: i64,
    pub address_connection_id: i64,
    pub step_order: i32,
}
