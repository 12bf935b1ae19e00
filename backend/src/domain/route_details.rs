//! Read model of a stored route and its human-readable summaries.

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;

use super::{Address, AvoidFlags, RouteKey};

const KM_TO_MILES: f64 = 0.621_371_2;

/// One ordered step of a stored route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    /// Zero-based position in the route.
    pub order: u32,
    /// Where the step starts.
    pub from: Address,
    /// Where the step ends.
    pub to: Address,
    /// Driving distance in metres.
    pub distance_meters: i64,
    /// Driving time in seconds.
    pub travel_seconds: i64,
}

impl RouteStep {
    /// Distance in kilometres rounded to two decimals.
    pub fn distance_km(&self) -> f64 {
        round2(metres_to_f64(self.distance_meters) / 1000.0)
    }

    /// Distance in miles rounded to two decimals.
    pub fn distance_miles(&self) -> f64 {
        km_to_miles(self.distance_km())
    }

    /// Travel time such as `1 hour and 5 minutes`.
    pub fn travel_time(&self) -> String {
        format_leg_travel_time(self.travel_seconds)
    }
}

/// A stored route with its steps in travel order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDetails {
    /// Public key.
    pub key: RouteKey,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Options shared by every step.
    pub avoid: AvoidFlags,
    /// Steps ordered by `order`.
    pub steps: Vec<RouteStep>,
}

impl RouteDetails {
    /// Sum of the rounded per-step distances, rounded again.
    pub fn total_distance_km(&self) -> f64 {
        round2(self.steps.iter().map(RouteStep::distance_km).sum())
    }

    /// Total distance in miles rounded to two decimals.
    pub fn total_distance_miles(&self) -> f64 {
        km_to_miles(self.total_distance_km())
    }

    /// Total driving time in seconds.
    pub fn total_travel_seconds(&self) -> i64 {
        self.steps.iter().map(|step| step.travel_seconds).sum()
    }

    /// Total travel time such as `1 day, 2 hours, and 5 minutes`.
    pub fn total_travel_time(&self) -> String {
        format_total_travel_time(self.total_travel_seconds())
    }

    /// Whole calendar days between creation and `now`.
    pub fn days_since_creation(&self, now: DateTime<Utc>) -> i64 {
        (now.date_naive() - self.created_at.date_naive()).num_days()
    }
}

fn metres_to_f64(metres: i64) -> f64 {
    metres.to_f64().unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn km_to_miles(km: f64) -> f64 {
    round2(km * KM_TO_MILES)
}

/// Split seconds into (days, hours, minutes) with minutes rounded up.
fn split_duration(seconds: i64) -> (i64, i64, i64) {
    let total_minutes = (seconds.max(0) + 59) / 60;
    let total_hours = total_minutes / 60;
    (total_hours / 24, total_hours % 24, total_minutes % 60)
}

fn unit(count: i64, singular: &str) -> String {
    match count {
        0 => String::new(),
        1 => format!("1 {singular}"),
        n => format!("{n} {singular}s"),
    }
}

/// Render a single leg's travel time in hours and minutes.
///
/// # Examples
/// ```
/// use route_planner::domain::format_leg_travel_time;
///
/// assert_eq!(format_leg_travel_time(3_901), "1 hour and 6 minutes");
/// assert_eq!(format_leg_travel_time(60), "1 minute");
/// ```
pub fn format_leg_travel_time(seconds: i64) -> String {
    let total_minutes = (seconds.max(0) + 59) / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let separator = if hours > 0 && minutes > 0 { " and " } else { "" };
    format!(
        "{}{separator}{}",
        unit(hours, "hour"),
        unit(minutes, "minute")
    )
}

/// Render a route's total travel time in days, hours and minutes.
///
/// Zero components are omitted; a leading day count is joined with a comma
/// list when all three components are present.
///
/// # Examples
/// ```
/// use route_planner::domain::format_total_travel_time;
///
/// assert_eq!(format_total_travel_time(93_900), "1 day, 2 hours, and 5 minutes");
/// assert_eq!(format_total_travel_time(86_700), "1 day and 5 minutes");
/// ```
pub fn format_total_travel_time(seconds: i64) -> String {
    let (days, hours, minutes) = split_duration(seconds);
    let all_three = days > 0 && hours > 0 && minutes > 0;

    let mut result = unit(days, "day");
    if all_three {
        result.push_str(", ");
    } else if days > 0 && (hours > 0 || minutes > 0) {
        result.push_str(" and ");
    }
    result.push_str(&unit(hours, "hour"));
    if all_three {
        result.push_str(", and ");
    } else if days == 0 && hours > 0 && minutes > 0 {
        result.push_str(" and ");
    }
    result.push_str(&unit(minutes, "minute"));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AddressKey, Coordinates};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[rstest]
    #[case(0, "")]
    #[case(1, "1 minute")]
    #[case(61, "2 minutes")]
    #[case(3_600, "1 hour")]
    #[case(7_260, "2 hours and 1 minute")]
    fn leg_travel_time(#[case] seconds: i64, #[case] expected: &str) {
        assert_eq!(format_leg_travel_time(seconds), expected);
    }

    #[rstest]
    #[case(0, "")]
    #[case(300, "5 minutes")]
    #[case(3_900, "1 hour and 5 minutes")]
    #[case(86_400, "1 day")]
    #[case(172_800 + 7_200, "2 days and 2 hours")]
    #[case(86_400 + 300, "1 day and 5 minutes")]
    #[case(86_400 + 7_200 + 300, "1 day, 2 hours, and 5 minutes")]
    #[case(86_399, "1 day")]
    fn total_travel_time(#[case] seconds: i64, #[case] expected: &str) {
        assert_eq!(format_total_travel_time(seconds), expected);
    }

    fn address(id: i64, street: &str) -> Address {
        Address {
            id,
            key: AddressKey::new(street, "Springfield", "IL", "62701", "USA"),
            coordinates: Coordinates::new(39.78, -89.65),
            updated_at: Utc::now(),
        }
    }

    #[fixture]
    fn details() -> RouteDetails {
        let a = address(1, "1 First St");
        let b = address(2, "2 Second St");
        let c = address(3, "3 Third St");
        RouteDetails {
            key: RouteKey::new("aB3dE5gH7jK9mN1p").expect("valid key"),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 1, 23, 0, 0)
                .single()
                .expect("valid time"),
            avoid: AvoidFlags::default(),
            steps: vec![
                RouteStep {
                    order: 0,
                    from: a,
                    to: b.clone(),
                    distance_meters: 1_234,
                    travel_seconds: 600,
                },
                RouteStep {
                    order: 1,
                    from: b,
                    to: c,
                    distance_meters: 10_006,
                    travel_seconds: 3_000,
                },
            ],
        }
    }

    #[rstest]
    fn totals_sum_rounded_steps(details: RouteDetails) {
        assert_eq!(details.steps[0].distance_km(), 1.23);
        assert_eq!(details.steps[1].distance_km(), 10.01);
        assert_eq!(details.total_distance_km(), 11.24);
        assert_eq!(details.total_distance_miles(), 6.98);
        assert_eq!(details.total_travel_time(), "1 hour");
    }

    #[rstest]
    fn days_since_creation_counts_calendar_days(details: RouteDetails) {
        let now = Utc
            .with_ymd_and_hms(2026, 1, 3, 1, 0, 0)
            .single()
            .expect("valid time");
        assert_eq!(details.days_since_creation(now), 2);
    }
}
