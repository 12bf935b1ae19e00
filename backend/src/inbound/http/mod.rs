//! HTTP inbound adapter exposing the geolocation and route endpoints.

pub mod error;
pub mod geolocate;
pub mod health;
pub mod routes;
pub mod schemas;
pub mod state;

pub use error::{ApiResult, json_config};
