//! Validation of incoming route requests.
//!
//! Checks run in a fixed order so callers always see the first problem a
//! client would fix: avoid flags, start and end addresses, intermediates,
//! intermediate count, then the degenerate same-start-and-end case.

use serde_json::{Map, Value};

use super::{AddressFields, AddressValidationError, AvoidFlags, Error};

/// Maximum number of intermediate stops accepted in one request.
pub const MAX_INTERMEDIATE_ADDRESSES: usize = 20;

const START_ADDRESS: &str = "start_address";
const END_ADDRESS: &str = "end_address";
const INTERMEDIATE_ADDRESSES: &str = "intermediate_addresses";

/// Errors raised while validating a route request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteRequestValidationError {
    /// The payload is not a JSON object.
    #[error("Could not parse your JSON data. Please make sure it is formatted correctly.")]
    NotAnObject,
    /// An avoid flag is present but not a boolean.
    #[error("The '{field}' should be a boolean value.")]
    NotABoolean {
        /// Name of the offending flag.
        field: &'static str,
    },
    /// A required address key is absent.
    #[error("Required key '{field}' is missing from JSON data.")]
    MissingField {
        /// Name of the missing key.
        field: &'static str,
    },
    /// A required address key is present but empty.
    #[error("Value for '{field}' is empty.")]
    EmptyField {
        /// Name of the empty key.
        field: &'static str,
    },
    /// An address failed shape validation.
    #[error(
        "The '{field}' key contained invalid address data. The server was expecting a JSON \
         object with the keys 'street', 'city', 'state', 'postal_code', 'country'. {source}"
    )]
    InvalidAddress {
        /// Key holding the invalid address.
        field: &'static str,
        /// Underlying address problem.
        source: AddressValidationError,
    },
    /// Intermediates were supplied as something other than a list.
    #[error("The 'intermediate_addresses' value was not an iterable list of JSON objects.")]
    IntermediatesNotAList,
    /// More than [`MAX_INTERMEDIATE_ADDRESSES`] intermediates were supplied.
    #[error("The server cannot process more than 20 intermediate addresses at once.")]
    TooManyIntermediates {
        /// Number of intermediates supplied.
        count: usize,
    },
    /// Start and end are the same address and there is nothing in between.
    #[error("The start and end addresses are the same, but there are no intermediate addresses.")]
    SameStartAndEnd,
}

impl From<RouteRequestValidationError> for Error {
    fn from(value: RouteRequestValidationError) -> Self {
        Error::invalid_request(value.to_string())
    }
}

/// A validated route request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    /// First stop.
    pub start: AddressFields,
    /// Stops in between, in the caller's order.
    pub intermediates: Vec<AddressFields>,
    /// Last stop.
    pub end: AddressFields,
    /// Routing options.
    pub avoid: AvoidFlags,
}

impl RouteRequest {
    /// Validate a loosely typed route request payload.
    ///
    /// # Examples
    /// ```
    /// use route_planner::domain::RouteRequest;
    /// use serde_json::json;
    ///
    /// let address = |street: &str| json!({
    ///     "street": street, "city": "Springfield", "state": "IL",
    ///     "postal_code": "62701", "country": "USA",
    /// });
    /// let request = RouteRequest::from_json(&json!({
    ///     "start_address": address("1 First St"),
    ///     "end_address": address("2 Second St"),
    /// }))
    /// .expect("valid request");
    /// assert!(request.avoid.avoid_ferries);
    /// assert!(request.intermediates.is_empty());
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, RouteRequestValidationError> {
        let object = value
            .as_object()
            .ok_or(RouteRequestValidationError::NotAnObject)?;
        let defaults = AvoidFlags::default();
        let avoid = AvoidFlags {
            avoid_highways: read_flag(object, "avoid_highways", defaults.avoid_highways)?,
            avoid_tolls: read_flag(object, "avoid_tolls", defaults.avoid_tolls)?,
            avoid_ferries: read_flag(object, "avoid_ferries", defaults.avoid_ferries)?,
        };

        let start = read_endpoint(object, START_ADDRESS)?;
        let end = read_endpoint(object, END_ADDRESS)?;
        let intermediates = read_intermediates(object)?;

        if intermediates.len() > MAX_INTERMEDIATE_ADDRESSES {
            return Err(RouteRequestValidationError::TooManyIntermediates {
                count: intermediates.len(),
            });
        }
        if intermediates.is_empty() && start.key() == end.key() {
            return Err(RouteRequestValidationError::SameStartAndEnd);
        }

        Ok(Self {
            start,
            intermediates,
            end,
            avoid,
        })
    }

    /// Every stop in request order: start, intermediates, end.
    pub fn stops(&self) -> impl Iterator<Item = &AddressFields> {
        std::iter::once(&self.start)
            .chain(self.intermediates.iter())
            .chain(std::iter::once(&self.end))
    }
}

fn read_flag(
    object: &Map<String, Value>,
    field: &'static str,
    default: bool,
) -> Result<bool, RouteRequestValidationError> {
    match object.get(field) {
        None => Ok(default),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(RouteRequestValidationError::NotABoolean { field }),
    }
}

fn read_endpoint(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<AddressFields, RouteRequestValidationError> {
    let value = object
        .get(field)
        .ok_or(RouteRequestValidationError::MissingField { field })?;
    if is_empty(value) {
        return Err(RouteRequestValidationError::EmptyField { field });
    }
    AddressFields::from_json(value)
        .map_err(|source| RouteRequestValidationError::InvalidAddress { field, source })
}

fn read_intermediates(
    object: &Map<String, Value>,
) -> Result<Vec<AddressFields>, RouteRequestValidationError> {
    let items = match object.get(INTERMEDIATE_ADDRESSES) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(RouteRequestValidationError::IntermediatesNotAList),
    };
    items
        .iter()
        .map(|item| {
            AddressFields::from_json(item).map_err(|source| {
                RouteRequestValidationError::InvalidAddress {
                    field: INTERMEDIATE_ADDRESSES,
                    source,
                }
            })
        })
        .collect()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    //! Validation order and messages for route requests.

    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn address(street: &str) -> Value {
        json!({
            "street": street,
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62701",
            "country": "USA",
        })
    }

    #[fixture]
    fn payload() -> Value {
        json!({
            "start_address": address("1 First St"),
            "intermediate_addresses": [address("2 Second St")],
            "end_address": address("3 Third St"),
        })
    }

    #[rstest]
    fn fills_default_avoid_flags(payload: Value) {
        let request = RouteRequest::from_json(&payload).expect("valid");
        assert_eq!(request.avoid, AvoidFlags::default());
        assert_eq!(request.stops().count(), 3);
    }

    #[rstest]
    fn honours_supplied_avoid_flags(mut payload: Value) {
        payload["avoid_highways"] = json!(true);
        payload["avoid_ferries"] = json!(false);
        let request = RouteRequest::from_json(&payload).expect("valid");
        assert!(request.avoid.avoid_highways);
        assert!(!request.avoid.avoid_tolls);
        assert!(!request.avoid.avoid_ferries);
    }

    #[rstest]
    #[case("avoid_highways")]
    #[case("avoid_tolls")]
    #[case("avoid_ferries")]
    fn rejects_non_boolean_flags(mut payload: Value, #[case] field: &'static str) {
        payload[field] = json!("yes");
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(error, RouteRequestValidationError::NotABoolean { field });
        assert_eq!(error.to_string(), format!("The '{field}' should be a boolean value."));
    }

    #[rstest]
    fn flag_errors_win_over_address_errors(mut payload: Value) {
        payload["avoid_tolls"] = json!(1);
        payload.as_object_mut().expect("object").remove("start_address");
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(
            error,
            RouteRequestValidationError::NotABoolean {
                field: "avoid_tolls"
            }
        );
    }

    #[rstest]
    #[case("start_address")]
    #[case("end_address")]
    fn rejects_missing_endpoints(mut payload: Value, #[case] field: &'static str) {
        payload.as_object_mut().expect("object").remove(field);
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(error, RouteRequestValidationError::MissingField { field });
    }

    #[rstest]
    fn rejects_empty_endpoint(mut payload: Value) {
        payload["end_address"] = json!({});
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(
            error,
            RouteRequestValidationError::EmptyField {
                field: "end_address"
            }
        );
    }

    #[rstest]
    fn rejects_invalid_endpoint_shape(mut payload: Value) {
        payload["start_address"]["city"] = json!("");
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(
            error,
            RouteRequestValidationError::InvalidAddress {
                field: "start_address",
                source: AddressValidationError::EmptyField { field: "city" },
            }
        );
        assert!(error.to_string().contains("Value for 'city' is empty."));
    }

    #[rstest]
    fn rejects_intermediates_that_are_not_a_list(mut payload: Value) {
        payload["intermediate_addresses"] = address("2 Second St");
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(error, RouteRequestValidationError::IntermediatesNotAList);
    }

    #[rstest]
    fn rejects_invalid_intermediate(mut payload: Value) {
        payload["intermediate_addresses"] = json!([address("2 Second St"), {"street": "x"}]);
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert!(matches!(
            error,
            RouteRequestValidationError::InvalidAddress {
                field: "intermediate_addresses",
                ..
            }
        ));
    }

    #[rstest]
    fn accepts_exactly_twenty_intermediates(mut payload: Value) {
        let stops: Vec<Value> = (0..20).map(|n| address(&format!("{n} Elm St"))).collect();
        payload["intermediate_addresses"] = Value::Array(stops);
        let request = RouteRequest::from_json(&payload).expect("valid");
        assert_eq!(request.intermediates.len(), 20);
    }

    #[rstest]
    fn rejects_twenty_one_intermediates(mut payload: Value) {
        let stops: Vec<Value> = (0..21).map(|n| address(&format!("{n} Elm St"))).collect();
        payload["intermediate_addresses"] = Value::Array(stops);
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(
            error,
            RouteRequestValidationError::TooManyIntermediates { count: 21 }
        );
        assert!(error.to_string().contains("cannot process more than 20"));
    }

    #[rstest]
    fn rejects_same_start_and_end_without_intermediates() {
        let payload = json!({
            "start_address": address("123 Main St"),
            "end_address": address("  123 main st "),
        });
        let error = RouteRequest::from_json(&payload).expect_err("must fail");
        assert_eq!(error, RouteRequestValidationError::SameStartAndEnd);
        assert!(error
            .to_string()
            .contains("start and end addresses are the same"));
    }

    #[rstest]
    fn allows_round_trip_with_intermediates(mut payload: Value) {
        payload["end_address"] = address("1 First St");
        assert!(RouteRequest::from_json(&payload).is_ok());
    }

    #[rstest]
    fn missing_intermediates_mean_none() {
        let payload = json!({
            "start_address": address("1 First St"),
            "intermediate_addresses": null,
            "end_address": address("3 Third St"),
        });
        let request = RouteRequest::from_json(&payload).expect("valid");
        assert!(request.intermediates.is_empty());
    }

    #[rstest]
    fn validation_errors_map_to_invalid_request() {
        let error: Error = RouteRequestValidationError::SameStartAndEnd.into();
        assert_eq!(error.code(), crate::domain::ErrorCode::InvalidRequest);
    }
}
