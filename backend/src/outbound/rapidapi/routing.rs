//! Routing adapter for the TrueWay directions API.
//!
//! The API answers an unroutable stop list with an empty body or an empty
//! JSON document rather than an error status. Those answers, and a route
//! without legs, surface as [`ExternalCallError::NotRoutable`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::client::{RapidApiClient, body_preview};
use super::dto::{LegDto, RoutingResponseDto};
use crate::domain::RouteLeg;
use crate::domain::ports::{ApiEndpoint, ExternalCallError, RoutingQuery, RoutingSource};

/// `RoutingSource` backed by a RapidAPI-hosted directions service.
#[derive(Clone)]
pub struct RapidApiRoutingSource {
    client: RapidApiClient,
}

impl RapidApiRoutingSource {
    /// Wrap a shared client.
    pub fn new(client: RapidApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoutingSource for RapidApiRoutingSource {
    async fn find_route(
        &self,
        endpoint: &ApiEndpoint,
        query: &RoutingQuery,
    ) -> Result<Vec<RouteLeg>, ExternalCallError> {
        let body = self.client.get(endpoint, &query_params(query)).await?;
        let legs = parse_legs(&body)?;
        if legs.is_empty() {
            info!(api = %endpoint.api_name, stops = query.stops.len(), "stops are not routable");
            return Err(ExternalCallError::not_routable());
        }
        Ok(legs)
    }
}

fn query_params(query: &RoutingQuery) -> Vec<(&'static str, String)> {
    vec![
        ("stops", query.stops_param()),
        ("avoid_highways", query.avoid.avoid_highways.to_string()),
        ("avoid_tolls", query.avoid.avoid_tolls.to_string()),
        ("avoid_ferries", query.avoid.avoid_ferries.to_string()),
        ("optimize", query.optimize.to_string()),
    ]
}

fn is_empty_document(body: &[u8]) -> Result<bool, ExternalCallError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(true);
    }
    let value: Value = serde_json::from_slice(body).map_err(|error| {
        ExternalCallError::decode(format!(
            "invalid routing JSON payload: {error}: {}",
            body_preview(body)
        ))
    })?;
    Ok(match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    })
}

fn parse_legs(body: &[u8]) -> Result<Vec<RouteLeg>, ExternalCallError> {
    if is_empty_document(body)? {
        return Ok(Vec::new());
    }
    let decoded: RoutingResponseDto = serde_json::from_slice(body).map_err(|error| {
        ExternalCallError::decode(format!("invalid routing JSON payload: {error}"))
    })?;
    decoded
        .route
        .legs
        .into_iter()
        .map(LegDto::into_domain_leg)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ExternalCallError::decode)
}
