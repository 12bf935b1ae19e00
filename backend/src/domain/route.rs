//! Routes, their legs, and the shared address connections they reference.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AddressId, Coordinates};

/// Length of a public route key.
pub const ROUTE_KEY_LENGTH: usize = 16;

/// Storage identifier of a [`Route`].
pub type RouteId = i64;

/// Storage identifier of an [`AddressConnection`].
pub type AddressConnectionId = i64;

/// Routing options that qualify a connection between two addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvoidFlags {
    /// Avoid motorways and highways.
    pub avoid_highways: bool,
    /// Avoid toll roads.
    pub avoid_tolls: bool,
    /// Avoid ferry crossings.
    pub avoid_ferries: bool,
}

impl Default for AvoidFlags {
    fn default() -> Self {
        Self {
            avoid_highways: false,
            avoid_tolls: false,
            avoid_ferries: true,
        }
    }
}

/// One leg returned by the routing service.
///
/// Endpoints are the service's own snapped coordinates and only approximate
/// the stored address coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    /// Where the leg starts.
    pub start_point: Coordinates,
    /// Where the leg ends.
    pub end_point: Coordinates,
    /// Driving distance in metres.
    pub distance_meters: i64,
    /// Driving time in seconds.
    pub travel_seconds: i64,
}

/// A directed, option-qualified leg between two stored addresses, to be
/// inserted or refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAddressConnection {
    /// Origin address.
    pub from_address: AddressId,
    /// Destination address.
    pub to_address: AddressId,
    /// Options the leg was computed with.
    pub avoid: AvoidFlags,
    /// Driving distance in metres.
    pub distance_meters: i64,
    /// Driving time in seconds.
    pub travel_seconds: i64,
}

/// A stored address connection. Shared across routes and never deleted by
/// route removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressConnection {
    /// Storage identifier.
    pub id: AddressConnectionId,
    /// Origin address.
    pub from_address: AddressId,
    /// Destination address.
    pub to_address: AddressId,
    /// Options the leg was computed with.
    pub avoid: AvoidFlags,
    /// Driving distance in metres.
    pub distance_meters: i64,
    /// Driving time in seconds.
    pub travel_seconds: i64,
}

/// Validation errors for [`RouteKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteKeyValidationError {
    /// The key does not have exactly [`ROUTE_KEY_LENGTH`] characters.
    #[error("route key must be {ROUTE_KEY_LENGTH} characters, got {length}")]
    WrongLength {
        /// Observed length in characters.
        length: usize,
    },
    /// The key contains a character outside `[A-Za-z0-9]`.
    #[error("route key may only contain ASCII letters and digits, found {character:?}")]
    InvalidCharacter {
        /// The first offending character.
        character: char,
    },
}

/// Public opaque token identifying a stored route.
///
/// # Examples
/// ```
/// use route_planner::domain::RouteKey;
///
/// let key = RouteKey::new("aB3dE5gH7jK9mN1p").expect("valid key");
/// assert_eq!(key.as_ref(), "aB3dE5gH7jK9mN1p");
/// assert!(RouteKey::new("short").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "aB3dE5gH7jK9mN1p")]
pub struct RouteKey(String);

impl RouteKey {
    /// Validate and wrap a route key.
    pub fn new(value: impl Into<String>) -> Result<Self, RouteKeyValidationError> {
        let value = value.into();
        if let Some(character) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(RouteKeyValidationError::InvalidCharacter { character });
        }
        if value.len() != ROUTE_KEY_LENGTH {
            return Err(RouteKeyValidationError::WrongLength {
                length: value.len(),
            });
        }
        Ok(Self(value))
    }

    /// Draw a fresh key from `[A-Za-z0-9]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(
            (0..ROUTE_KEY_LENGTH)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect(),
        )
    }
}

impl AsRef<str> for RouteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RouteKey {
    type Err = RouteKeyValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for RouteKey {
    type Error = RouteKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RouteKey> for String {
    fn from(value: RouteKey) -> Self {
        value.0
    }
}

/// A freshly persisted route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Storage identifier.
    pub id: RouteId,
    /// Public key.
    pub key: RouteKey,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Connections in travel order; index is the step order.
    pub connection_ids: Vec<AddressConnectionId>,
}
