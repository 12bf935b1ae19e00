//! DTOs for decoding the geocoding and routing JSON responses.

use num_traits::ToPrimitive;
use serde::Deserialize;

use crate::domain::{Coordinates, RouteLeg};

#[derive(Debug, Deserialize)]
pub(super) struct PointDto {
    pub(super) lat: f64,
    pub(super) lng: f64,
}

impl From<PointDto> for Coordinates {
    fn from(value: PointDto) -> Self {
        Coordinates::new(value.lat, value.lng)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResponseDto {
    #[serde(default)]
    pub(super) results: Vec<GeocodeResultDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResultDto {
    pub(super) location: PointDto,
}

impl GeocodeResponseDto {
    pub(super) fn into_first_location(self) -> Result<Coordinates, String> {
        self.results
            .into_iter()
            .next()
            .map(|result| result.location.into())
            .ok_or_else(|| "geocoding response contained no results".to_owned())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RoutingResponseDto {
    pub(super) route: RouteDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct RouteDto {
    #[serde(default)]
    pub(super) legs: Vec<LegDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegDto {
    pub(super) distance: f64,
    pub(super) duration: f64,
    pub(super) start_point: PointDto,
    pub(super) end_point: PointDto,
}

impl LegDto {
    pub(super) fn into_domain_leg(self) -> Result<RouteLeg, String> {
        let (Some(distance_meters), Some(travel_seconds)) =
            (whole_non_negative(self.distance), whole_non_negative(self.duration))
        else {
            return Err(format!(
                "leg has invalid distance {} or duration {}",
                self.distance, self.duration
            ));
        };
        Ok(RouteLeg {
            start_point: self.start_point.into(),
            end_point: self.end_point.into(),
            distance_meters,
            travel_seconds,
        })
    }
}

/// Round to the nearest whole unit; `None` when negative, non-finite, or
/// beyond `i64`.
fn whole_non_negative(value: f64) -> Option<i64> {
    if value < 0.0 {
        return None;
    }
    value.round().to_i64()
}
