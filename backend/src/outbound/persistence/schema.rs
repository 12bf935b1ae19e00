//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`
//! exactly. `diesel print-schema` regenerates them from a live database.

diesel::table! {
    /// External API configuration, one row per logical API.
    apis (id) {
        id -> Int8,
        /// Logical name such as `Geolocate` or `Routing`.
        name -> Varchar,
        base_url -> Text,
        credential -> Text,
        /// Minimum spacing between calls, in seconds.
        request_delay_seconds -> Float8,
        max_attempts -> Int4,
    }
}

diesel::table! {
    /// Throttle admission queue. The oldest `waiting` row per API may call it.
    api_requests (id) {
        id -> Int8,
        api_name -> Varchar,
        requested_at -> Timestamptz,
        /// One of `waiting`, `finished`, `error`.
        status -> Varchar,
        /// When the throttle let the call through; null while queued.
        admitted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Geocoded addresses, unique on their normalised components.
    addresses (id) {
        id -> Int8,
        street -> Text,
        city -> Text,
        state -> Text,
        postal_code -> Text,
        country -> Text,
        latitude -> Float8,
        longitude -> Float8,
        /// Time of the last successful geocode.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed, option-qualified legs shared between routes.
    address_connections (id) {
        id -> Int8,
        from_address -> Int8,
        to_address -> Int8,
        avoid_highways -> Bool,
        avoid_tolls -> Bool,
        avoid_ferries -> Bool,
        distance_meters -> Int8,
        travel_seconds -> Int8,
    }
}

diesel::table! {
    /// Stored routes addressed by their public key.
    routes (id) {
        id -> Int8,
        route_key -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered steps of a route.
    route_address_connections (id) {
        id -> Int8,
        route_id -> Int8,
        address_connection_id -> Int8,
        step_order -> Int4,
    }
}

diesel::joinable!(route_address_connections -> routes (route_id));
diesel::joinable!(route_address_connections -> address_connections (address_connection_id));

diesel::allow_tables_to_appear_in_same_query!(
    apis,
    api_requests,
    addresses,
    address_connections,
    routes,
    route_address_connections,
);
