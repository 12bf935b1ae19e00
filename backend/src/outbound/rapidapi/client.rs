//! Shared reqwest plumbing for RapidAPI-hosted endpoints.
//!
//! Both hosted APIs authenticate with the same header pair and fail in the
//! same ways, so request building and error mapping live here once.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::domain::ports::{ApiEndpoint, ExternalCallError};

const RAPIDAPI_KEY_HEADER: &str = "X-RapidAPI-Key";
const RAPIDAPI_HOST_HEADER: &str = "X-RapidAPI-Host";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin GET client that signs requests for RapidAPI.
#[derive(Clone)]
pub struct RapidApiClient {
    client: Client,
}

impl RapidApiClient {
    /// Build a client with the default 30 second request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Send a signed GET to `endpoint` and return the raw success body.
    pub(super) async fn get(
        &self,
        endpoint: &ApiEndpoint,
        params: &[(&str, String)],
    ) -> Result<Vec<u8>, ExternalCallError> {
        let url = parse_endpoint(endpoint)?;
        let host = url
            .host_str()
            .ok_or_else(|| {
                ExternalCallError::transport(format!(
                    "{} endpoint has no host: {}",
                    endpoint.api_name, endpoint.base_url
                ))
            })?
            .to_owned();

        debug!(api = %endpoint.api_name, host = %host, "calling external api");
        let response = self
            .client
            .get(url)
            .header(RAPIDAPI_KEY_HEADER, endpoint.credential.as_str())
            .header(RAPIDAPI_HOST_HEADER, host)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let error = map_status_error(status, body.as_ref());
            if status.is_client_error() {
                warn!(api = %endpoint.api_name, error = %error, "external api rejected request");
            }
            return Err(error);
        }
        Ok(body.to_vec())
    }
}

fn parse_endpoint(endpoint: &ApiEndpoint) -> Result<Url, ExternalCallError> {
    Url::parse(&endpoint.base_url).map_err(|error| {
        ExternalCallError::transport(format!(
            "invalid {} endpoint {}: {error}",
            endpoint.api_name, endpoint.base_url
        ))
    })
}

fn map_transport_error(error: reqwest::Error) -> ExternalCallError {
    if error.is_timeout() {
        ExternalCallError::timeout(error.to_string())
    } else {
        ExternalCallError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ExternalCallError {
    let preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ExternalCallError::timeout(format!("status {}", status.as_u16()))
        }
        _ => ExternalCallError::status(status.as_u16(), preview),
    }
}

/// Collapse whitespace and cap a response body for log and error messages.
pub(super) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn endpoint(base_url: &str) -> ApiEndpoint {
        ApiEndpoint {
            api_name: "Geolocate".to_owned(),
            base_url: base_url.to_owned(),
            credential: "secret".to_owned(),
        }
    }

    #[rstest]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT)]
    fn timeout_statuses_map_to_timeout(#[case] status: StatusCode) {
        assert!(matches!(
            map_status_error(status, b""),
            ExternalCallError::Timeout { .. }
        ));
    }

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS)]
    #[case::forbidden(StatusCode::FORBIDDEN)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR)]
    fn other_statuses_keep_code_and_preview(#[case] status: StatusCode) {
        let error = map_status_error(status, b"{\"message\":  \"quota\nexceeded\"}");
        assert_eq!(
            error,
            ExternalCallError::status(status.as_u16(), "{\"message\": \"quota exceeded\"}")
        );
        assert!(!error.is_terminal());
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.len(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    fn host_header_comes_from_endpoint_url() {
        let url = parse_endpoint(&endpoint("https://trueway-geocoding.p.rapidapi.com/Geocode"))
            .expect("valid url");
        assert_eq!(url.host_str(), Some("trueway-geocoding.p.rapidapi.com"));
    }

    #[rstest]
    fn malformed_endpoint_is_a_transport_error() {
        let error = parse_endpoint(&endpoint("not a url")).expect_err("must fail");
        assert!(matches!(error, ExternalCallError::Transport { .. }));
    }
}
