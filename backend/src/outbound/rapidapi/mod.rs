//! RapidAPI outbound adapters.
//!
//! Thin reqwest implementations of the `GeocodingSource` and `RoutingSource`
//! ports. Endpoint URLs and credentials arrive with every call, so one client
//! serves whatever the API table currently says.

mod client;
mod dto;
mod geocoding;
mod routing;

pub use client::RapidApiClient;
pub use geocoding::RapidApiGeocodingSource;
pub use routing::RapidApiRoutingSource;
