//! Mapping helpers from driven-port persistence errors to domain errors.
//!
//! Connection failures are transient and surface as `service_unavailable`;
//! query failures point at a bug or schema drift and surface as `internal`.

use crate::domain::Error;
use crate::domain::ports::{
    AddressRepositoryError, ApiConfigRepositoryError, ApiRequestRepositoryError,
    RouteRepositoryError,
};

pub(crate) fn map_api_config_error(error: ApiConfigRepositoryError) -> Error {
    match error {
        ApiConfigRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("api configuration unavailable: {message}"))
        }
        ApiConfigRepositoryError::Query { message } => {
            Error::internal(format!("api configuration lookup failed: {message}"))
        }
    }
}

pub(crate) fn map_api_request_error(error: ApiRequestRepositoryError) -> Error {
    match error {
        ApiRequestRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("request queue unavailable: {message}"))
        }
        ApiRequestRepositoryError::Query { message } => {
            Error::internal(format!("request queue update failed: {message}"))
        }
    }
}

pub(crate) fn map_address_error(error: AddressRepositoryError) -> Error {
    match error {
        AddressRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("address store unavailable: {message}"))
        }
        AddressRepositoryError::Query { message } => {
            Error::internal(format!("address store query failed: {message}"))
        }
    }
}

pub(crate) fn map_route_error(error: RouteRepositoryError) -> Error {
    match error {
        RouteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("route store unavailable: {message}"))
        }
        RouteRepositoryError::DuplicateKey { route_key } => {
            Error::internal(format!("route key {route_key} could not be reserved"))
        }
        RouteRepositoryError::Query { message } => {
            Error::internal(format!("route store query failed: {message}"))
        }
    }
}
