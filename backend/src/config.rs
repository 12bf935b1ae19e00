//! Process configuration loaded via OrthoConfig.
//!
//! Values layer CLI arguments over `ROUTE_PLANNER_*` environment variables
//! over an optional configuration file. API rows built from this
//! configuration are only seeds: once a row exists in the `apis` table, the
//! table is authoritative.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{
    ApiConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_DELAY_SECONDS, GEOLOCATE_API, ROUTING_API,
    ThrottleConfig,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_GEOCODING_URL: &str = "https://trueway-geocoding.p.rapidapi.com/Geocode";
const DEFAULT_ROUTING_URL: &str = "https://trueway-directions2.p.rapidapi.com/FindDrivingRoute";

/// Runtime settings for the route planner service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROUTE_PLANNER")]
pub struct AppConfig {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Geocoding endpoint seeded into the `Geolocate` API row.
    pub geocoding_url: Option<String>,
    /// Credential seeded into the `Geolocate` API row.
    pub geocoding_key: Option<String>,
    /// Routing endpoint seeded into the `Routing` API row.
    pub routing_url: Option<String>,
    /// Credential seeded into the `Routing` API row.
    pub routing_key: Option<String>,
    /// Minimum spacing between calls to one API, seeded into new rows.
    pub request_delay_seconds: Option<f64>,
    /// Attempt budget seeded into new rows.
    pub max_attempts: Option<u32>,
    /// Longest a caller may queue for a throttle slot, in seconds.
    pub admission_timeout_secs: Option<u64>,
    /// Interval at which queued callers re-check the head of the queue.
    pub poll_interval_ms: Option<u64>,
    /// Run startup maintenance and exit without serving.
    #[ortho_config(default = false)]
    pub maintenance_only: bool,
}

impl AppConfig {
    /// Return the bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Default rows for the two external APIs.
    pub fn default_apis(&self) -> Vec<ApiConfig> {
        let request_delay_seconds = self
            .request_delay_seconds
            .unwrap_or(DEFAULT_REQUEST_DELAY_SECONDS);
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let row = |name: &str, url: &Option<String>, fallback: &str, key: &Option<String>| {
            ApiConfig {
                name: name.to_owned(),
                base_url: url.clone().unwrap_or_else(|| fallback.to_owned()),
                credential: key.clone().unwrap_or_default(),
                request_delay_seconds,
                max_attempts,
            }
        };
        vec![
            row(
                GEOLOCATE_API,
                &self.geocoding_url,
                DEFAULT_GEOCODING_URL,
                &self.geocoding_key,
            ),
            row(
                ROUTING_API,
                &self.routing_url,
                DEFAULT_ROUTING_URL,
                &self.routing_key,
            ),
        ]
    }

    /// Throttle settings, with unset values taking the throttle defaults.
    pub fn throttle(&self) -> ThrottleConfig {
        let defaults = ThrottleConfig::default();
        ThrottleConfig {
            admission_timeout: self
                .admission_timeout_secs
                .map_or(defaults.admission_timeout, Duration::from_secs),
            poll_interval: self
                .poll_interval_ms
                .map_or(defaults.poll_interval, Duration::from_millis),
        }
    }
}
