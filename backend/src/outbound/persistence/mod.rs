//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL via Diesel with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic writes**: upserts use `ON CONFLICT` and multi-row writes run in
//!   a single transaction.
//!
//! # Example
//!
//! ```ignore
//! use route_planner::outbound::persistence::{DbPool, DieselRouteRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/routes")).await?;
//! let routes = DieselRouteRepository::new(pool);
//! ```

mod diesel_address_repository;
mod diesel_api_config_repository;
mod diesel_api_request_repository;
mod diesel_route_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_address_repository::DieselAddressRepository;
pub use diesel_api_config_repository::DieselApiConfigRepository;
pub use diesel_api_request_repository::DieselApiRequestRepository;
pub use diesel_route_repository::DieselRouteRepository;
pub use pool::{DbPool, PoolConfig, PoolError, run_migrations};
