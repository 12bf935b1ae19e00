//! HTTP server configuration object.

use std::net::SocketAddr;

use route_planner::domain::ThrottleConfig;
use route_planner::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) throttle: ThrottleConfig,
}

impl ServerConfig {
    /// Configuration binding `bind_addr` with fixture ports and the default
    /// throttle settings.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            throttle: ThrottleConfig::default(),
        }
    }

    /// Attach a database connection pool.
    ///
    /// Without one the server answers from fixture ports.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Override the throttle admission timeout and poll interval.
    #[must_use]
    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }
}
