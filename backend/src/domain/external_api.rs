//! External API configuration and per-call request records.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Logical name of the geocoding API row.
pub const GEOLOCATE_API: &str = "Geolocate";
/// Logical name of the routing API row.
pub const ROUTING_API: &str = "Routing";

/// Default spacing between calls to one API, in seconds.
pub const DEFAULT_REQUEST_DELAY_SECONDS: f64 = 0.5;
/// Default attempt budget per admitted call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Per-API settings, editable outside the service between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Unique logical name (`Geolocate`, `Routing`).
    pub name: String,
    /// Endpoint URL.
    pub base_url: String,
    /// Credential sent with every call.
    pub credential: String,
    /// Minimum spacing between admitted calls, in fractional seconds.
    pub request_delay_seconds: f64,
    /// Attempt budget per admitted call.
    pub max_attempts: u32,
}

impl ApiConfig {
    /// Minimum spacing between admitted calls.
    ///
    /// Negative or non-finite values are treated as zero.
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_seconds).unwrap_or(Duration::ZERO)
    }

    /// Back-off between failed attempts: twice the request delay.
    pub fn retry_backoff(&self) -> Duration {
        self.request_delay().saturating_mul(2)
    }

    /// Attempt budget, never less than one.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Storage identifier of an [`ApiRequestRecord`].
pub type ApiRequestId = i64;

/// Lifecycle state of one call cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiRequestStatus {
    /// Registered with the throttle and not yet completed.
    Waiting,
    /// Completed successfully.
    Finished,
    /// Abandoned, exhausted, or reconciled after a crash.
    Error,
}

impl ApiRequestStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }

    /// Whether the record has left the queue.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

impl fmt::Display for ApiRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown api request status: {0}")]
pub struct ParseApiRequestStatusError(pub String);

impl FromStr for ApiRequestStatus {
    type Err = ParseApiRequestStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "waiting" => Ok(Self::Waiting),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            other => Err(ParseApiRequestStatusError(other.to_owned())),
        }
    }
}

/// One registered call cycle against an external API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequestRecord {
    /// Storage identifier; ascending in registration order.
    pub id: ApiRequestId,
    /// Owning API name.
    pub api_name: String,
    /// Registration time.
    pub requested_at: DateTime<Utc>,
    /// Current state.
    pub status: ApiRequestStatus,
}
