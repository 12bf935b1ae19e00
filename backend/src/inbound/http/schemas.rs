//! OpenAPI schema definitions for loosely typed request bodies.
//!
//! Route and address payloads are accepted as raw JSON and validated by the
//! domain, which tolerates single-element lists and numeric postal codes.
//! These wrappers document the canonical shape without constraining what the
//! handlers accept.

use utoipa::ToSchema;

/// Postal address accepted by `POST /geolocate` and inside route requests.
#[derive(ToSchema)]
#[schema(as = AddressPayload)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AddressSchema {
    /// Street line.
    #[schema(example = "123 Main St")]
    street: String,
    /// City.
    #[schema(example = "Springfield")]
    city: String,
    /// State or region.
    #[schema(example = "IL")]
    state: String,
    /// Postal code.
    #[schema(example = "62701")]
    postal_code: String,
    /// Country.
    #[schema(example = "USA")]
    country: String,
}

/// Route request accepted by `POST /routes`.
#[derive(ToSchema)]
#[schema(as = RouteRequestPayload)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct RouteRequestSchema {
    /// First stop.
    start_address: AddressSchema,
    /// Up to twenty stops to visit in between, in any order.
    intermediate_addresses: Option<Vec<AddressSchema>>,
    /// Last stop.
    end_address: AddressSchema,
    /// Avoid motorways. Defaults to `false`.
    avoid_highways: Option<bool>,
    /// Avoid toll roads. Defaults to `false`.
    avoid_tolls: Option<bool>,
    /// Avoid ferries. Defaults to `true`.
    avoid_ferries: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    fn address_schema_lists_every_field() {
        assert_eq!(AddressSchema::name(), "AddressPayload");
        let json = schema_to_json::<AddressSchema>();
        for field in crate::domain::ADDRESS_FIELD_NAMES {
            assert!(json.contains(field), "schema should contain {field}");
        }
    }

    #[rstest]
    fn route_request_schema_lists_avoid_flags() {
        assert_eq!(RouteRequestSchema::name(), "RouteRequestPayload");
        let json = schema_to_json::<RouteRequestSchema>();
        for field in [
            "start_address",
            "intermediate_addresses",
            "end_address",
            "avoid_highways",
            "avoid_tolls",
            "avoid_ferries",
        ] {
            assert!(json.contains(field), "schema should contain {field}");
        }
    }
}
