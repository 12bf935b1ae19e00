//! Shared request context and error contract for outbound API calls.

use crate::domain::ApiConfig;

use super::define_port_error;

/// Connection details handed to an outbound adapter for one call.
///
/// Built from the API row at call time so configuration edits apply to the
/// next orchestration run without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// Logical API name, used for log correlation.
    pub api_name: String,
    /// Endpoint URL.
    pub base_url: String,
    /// Credential sent with the call.
    pub credential: String,
}

impl From<&ApiConfig> for ApiEndpoint {
    fn from(value: &ApiConfig) -> Self {
        Self {
            api_name: value.name.clone(),
            base_url: value.base_url.clone(),
            credential: value.credential.clone(),
        }
    }
}

define_port_error! {
    /// Errors surfaced by outbound geocoding and routing adapters.
    pub enum ExternalCallError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "external api transport failed: {message}",
        /// The call exceeded the client timeout.
        Timeout { message: String } =>
            "external api timeout: {message}",
        /// The API answered with a non-success status.
        Status { status: u16, message: String } =>
            "external api returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "external api response decode failed: {message}",
        /// The API answered but found no drivable path between the stops.
        NotRoutable =>
            "no drivable route exists between the requested stops",
    }
}

impl ExternalCallError {
    /// Terminal outcomes propagate without consuming another attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotRoutable)
    }
}
