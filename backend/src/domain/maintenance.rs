//! Process-start housekeeping for the request queue and API registry.
//!
//! Must run before any orchestration call is accepted: a `waiting` record
//! left by a crashed process would otherwise sit at the head of its API's
//! queue until every later caller timed out behind it.

use std::sync::Arc;

use tracing::info;

use crate::domain::Error;
use crate::domain::persistence_mapping::{map_api_config_error, map_api_request_error};
use crate::domain::ports::{ApiConfigRepository, ApiRequestRepository};

use super::ApiConfig;

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaintenanceReport {
    /// API rows created because none existed under that name.
    pub apis_created: usize,
    /// Stale `waiting` records moved to `error`.
    pub requests_failed: u64,
}

/// Seeds default API rows and clears stale queue entries.
pub struct StartupMaintenance {
    apis: Arc<dyn ApiConfigRepository>,
    requests: Arc<dyn ApiRequestRepository>,
    defaults: Vec<ApiConfig>,
}

impl StartupMaintenance {
    /// Build a maintenance pass seeding `defaults` when absent.
    pub fn new(
        apis: Arc<dyn ApiConfigRepository>,
        requests: Arc<dyn ApiRequestRepository>,
        defaults: Vec<ApiConfig>,
    ) -> Self {
        Self {
            apis,
            requests,
            defaults,
        }
    }

    /// Run the pass. Safe to repeat.
    pub async fn run(&self) -> Result<MaintenanceReport, Error> {
        let apis_created = self
            .apis
            .ensure_defaults(&self.defaults)
            .await
            .map_err(map_api_config_error)?;
        let requests_failed = self
            .requests
            .fail_all_waiting()
            .await
            .map_err(map_api_request_error)?;

        info!(apis_created, requests_failed, "startup maintenance complete");
        Ok(MaintenanceReport {
            apis_created,
            requests_failed,
        })
    }
}
