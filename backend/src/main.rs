//! Backend entry-point: migrates the schema, runs startup maintenance, and
//! serves the route planner API.

mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use route_planner::config::AppConfig;
use route_planner::domain::StartupMaintenance;
use route_planner::inbound::http::health::HealthState;
use route_planner::outbound::persistence::{
    DbPool, DieselApiConfigRepository, DieselApiRequestRepository, PoolConfig, run_migrations,
};

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load()
        .map_err(|e| std::io::Error::other(format!("configuration failed to load: {e}")))?;
    let database_url = config.database_url.clone().ok_or_else(|| {
        std::io::Error::other("ROUTE_PLANNER_DATABASE_URL must be set to start the service")
    })?;
    let bind_addr: SocketAddr = config.bind_addr().parse().map_err(|e| {
        std::io::Error::other(format!("invalid bind address {}: {e}", config.bind_addr()))
    })?;

    let migration_url = database_url.clone();
    let applied = tokio::task::spawn_blocking(move || run_migrations(&migration_url))
        .await
        .map_err(|e| std::io::Error::other(format!("migration task failed: {e}")))?
        .map_err(std::io::Error::other)?;
    info!(applied, "database schema up to date");

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(std::io::Error::other)?;

    let maintenance = StartupMaintenance::new(
        Arc::new(DieselApiConfigRepository::new(pool.clone())),
        Arc::new(DieselApiRequestRepository::new(pool.clone())),
        config.default_apis(),
    );
    maintenance
        .run()
        .await
        .map_err(|e| std::io::Error::other(format!("startup maintenance failed: {e}")))?;

    if config.maintenance_only {
        info!("maintenance-only run finished");
        return Ok(());
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(bind_addr)
            .with_db_pool(pool)
            .with_throttle(config.throttle()),
    )?;

    health_state.mark_ready();
    info!(%bind_addr, "serving route planner api");
    server.await
}
