//! Postal addresses, their normalised identity, and stored coordinates.
//!
//! Incoming address payloads are loosely typed JSON objects. They are checked
//! once at the boundary into [`AddressFields`]; every comparison and lookup
//! afterwards goes through the normalised [`AddressKey`], which is also the
//! unique key of the address store.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::Error;

/// Names of the required address fields, in storage order.
pub const ADDRESS_FIELD_NAMES: [&str; 5] = ["street", "city", "state", "postal_code", "country"];

/// Age after which a cached geocode is considered stale.
pub const ADDRESS_FRESHNESS_DAYS: i64 = 30;

/// Storage identifier of an [`Address`] row.
pub type AddressId = i64;

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Build a coordinate pair.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Render as `lat,lng`, the stop format expected by the routing API.
    pub fn to_stop(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Errors raised while reading an address payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressValidationError {
    /// The payload is not a JSON object.
    #[error("Address data must be a JSON object with the keys 'street', 'city', 'state', 'postal_code', 'country'.")]
    NotAnObject,
    /// A required field is absent.
    #[error("Required key '{field}' is missing from JSON data.")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// A required field is present but blank.
    #[error("Value for '{field}' is empty.")]
    EmptyField {
        /// Name of the blank field.
        field: &'static str,
    },
    /// A field holds a list with more (or fewer) than one element, or a
    /// value that is not text.
    #[error("Could not parse the '{field}' value. The server was expecting a string.")]
    NotAString {
        /// Name of the offending field.
        field: &'static str,
    },
}

impl From<AddressValidationError> for Error {
    fn from(value: AddressValidationError) -> Self {
        Error::invalid_request(value.to_string())
    }
}

/// Normalise one address component.
///
/// Upper-cases, trims, and collapses internal whitespace runs to a single
/// space. Idempotent.
///
/// # Examples
/// ```
/// use route_planner::domain::normalize_component;
///
/// assert_eq!(normalize_component("  123  main\tst "), "123 MAIN ST");
/// ```
pub fn normalize_component(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Address fields as supplied by a caller, validated for presence and shape
/// but not yet normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

impl AddressFields {
    /// Read and validate an address JSON object.
    ///
    /// A field given as a single-element list is unwrapped to its scalar; any
    /// other list is rejected. Numbers are accepted as their decimal text so
    /// numeric postal codes survive clients that do not quote them.
    ///
    /// # Examples
    /// ```
    /// use route_planner::domain::AddressFields;
    /// use serde_json::json;
    ///
    /// let fields = AddressFields::from_json(&json!({
    ///     "street": ["123 Main St"],
    ///     "city": "Springfield",
    ///     "state": "IL",
    ///     "postal_code": 62701,
    ///     "country": "USA",
    /// }))
    /// .expect("valid address");
    /// assert_eq!(fields.street, "123 Main St");
    /// assert_eq!(fields.postal_code, "62701");
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, AddressValidationError> {
        let object = value.as_object().ok_or(AddressValidationError::NotAnObject)?;
        let read = |field: &'static str| -> Result<String, AddressValidationError> {
            let raw = object
                .get(field)
                .ok_or(AddressValidationError::MissingField { field })?;
            let text = scalar_text(raw, field)?;
            if text.trim().is_empty() {
                return Err(AddressValidationError::EmptyField { field });
            }
            Ok(text)
        };

        Ok(Self {
            street: read("street")?,
            city: read("city")?,
            state: read("state")?,
            postal_code: read("postal_code")?,
            country: read("country")?,
        })
    }

    /// Normalised identity of these fields.
    pub fn key(&self) -> AddressKey {
        AddressKey::new(
            &self.street,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        )
    }
}

fn scalar_text(raw: &Value, field: &'static str) -> Result<String, AddressValidationError> {
    match raw {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Array(items) => match items.as_slice() {
            [single] if !single.is_array() => scalar_text(single, field),
            [] => Err(AddressValidationError::EmptyField { field }),
            _ => Err(AddressValidationError::NotAString { field }),
        },
        _ => Err(AddressValidationError::NotAString { field }),
    }
}

/// Normalised address identity; the unique key of stored addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey {
    street: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

impl AddressKey {
    /// Build a key, normalising every component.
    pub fn new(street: &str, city: &str, state: &str, postal_code: &str, country: &str) -> Self {
        Self {
            street: normalize_component(street),
            city: normalize_component(city),
            state: normalize_component(state),
            postal_code: normalize_component(postal_code),
            country: normalize_component(country),
        }
    }

    /// Normalised street.
    pub fn street(&self) -> &str {
        &self.street
    }

    /// Normalised city.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Normalised state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Normalised postal code.
    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    /// Normalised country.
    pub fn country(&self) -> &str {
        &self.country
    }

    /// One-line free-text query understood by the geocoding API.
    pub fn geocode_query(&self) -> String {
        format!(
            "{}, {}, {}, {} {}",
            self.street, self.city, self.state, self.country, self.postal_code
        )
    }
}

/// A geocoded, stored address.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    /// Storage identifier.
    pub id: AddressId,
    /// Normalised identity.
    pub key: AddressKey,
    /// Stored coordinates.
    pub coordinates: Coordinates,
    /// Time of the last successful geocode.
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Whether the stored coordinates are recent enough to skip geocoding.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.updated_at > now - TimeDelta::days(ADDRESS_FRESHNESS_DAYS)
    }

    /// First display line: the street.
    pub fn line_one(&self) -> String {
        title_case(self.key.street())
    }

    /// Second display line: `City, ST 12345`.
    pub fn line_two(&self) -> String {
        title_case(&format!(
            "{}, {} {}",
            self.key.city(),
            self.key.state(),
            self.key.postal_code()
        ))
    }

    /// Third display line: the country.
    pub fn line_three(&self) -> String {
        title_case(self.key.country())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.line_one(),
            self.line_two(),
            self.line_three()
        )
    }
}

/// Capitalise the first letter of every alphabetic run, lower-casing the rest.
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if previous_is_letter {
            result.extend(ch.to_lowercase());
        } else {
            result.extend(ch.to_uppercase());
        }
        previous_is_letter = ch.is_alphabetic();
    }
    result
}
