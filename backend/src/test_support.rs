//! Test utilities for the route planner crate.
//!
//! Shared by unit tests in `src/` and, through the `test-support` feature, by
//! integration tests in `tests/`. Nothing here touches the network or a
//! database.

pub mod clock;
pub mod in_memory;
pub mod sources;

pub use clock::{ImmediateSleeper, MutableClock, RecordingSleeper};
pub use in_memory::{
    InMemoryAddressRepository, InMemoryApiConfigRepository, InMemoryApiRequestRepository,
    InMemoryRouteRepository,
};
pub use sources::{ScriptedGeocodingSource, ScriptedRoutingSource, SequenceRouteKeyGenerator};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a test double's state, recovering it if another test thread panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
