//! Injectable runtime seams: sleeping and route key generation.

use std::time::Duration;

use async_trait::async_trait;

use super::RouteKey;

/// Async sleeping abstraction so waits can be observed in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Source of fresh public route keys.
#[cfg_attr(test, mockall::automock)]
pub trait RouteKeyGenerator: Send + Sync {
    /// Produce a candidate key. Uniqueness is enforced by the store.
    fn generate(&self) -> RouteKey;
}

/// Thread-RNG generator drawing from `[A-Za-z0-9]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRouteKeyGenerator;

impl RouteKeyGenerator for RandomRouteKeyGenerator {
    fn generate(&self) -> RouteKey {
        RouteKey::random(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ROUTE_KEY_LENGTH;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    fn random_keys_are_valid_and_distinct() {
        let generator = RandomRouteKeyGenerator;
        let keys: HashSet<String> = (0..64).map(|_| generator.generate().into()).collect();
        assert_eq!(keys.len(), 64);
        assert!(keys.iter().all(|key| key.len() == ROUTE_KEY_LENGTH));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_advances_virtual_time() {
        let before = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(3)).await;
        assert!(before.elapsed() >= Duration::from_secs(3));
    }
}
