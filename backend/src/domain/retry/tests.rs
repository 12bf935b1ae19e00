//! Attempt budget, back-off, and record settlement for the retry executor.

use super::*;
use crate::domain::{ErrorCode, GEOLOCATE_API, ROUTING_API, ThrottleConfig};
use crate::test_support::{
    InMemoryApiConfigRepository, InMemoryApiRequestRepository, MutableClock, RecordingSleeper,
};
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

struct Harness {
    requests: Arc<InMemoryApiRequestRepository>,
    sleeper: Arc<RecordingSleeper>,
    executor: RetryExecutor,
}

fn api(name: &str, attempts: u32) -> ApiConfig {
    ApiConfig {
        name: name.to_owned(),
        base_url: format!("https://{}.invalid/", name.to_lowercase()),
        credential: "key".to_owned(),
        request_delay_seconds: 0.5,
        max_attempts: attempts,
    }
}

fn harness_with(apis: Vec<ApiConfig>) -> Harness {
    let requests = Arc::new(InMemoryApiRequestRepository::default());
    let sleeper = Arc::new(RecordingSleeper::default());
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid time"),
    ));
    let throttle = Arc::new(RequestThrottle::new(
        requests.clone(),
        clock,
        sleeper.clone(),
        ThrottleConfig::default(),
    ));
    let executor = RetryExecutor::new(
        Arc::new(InMemoryApiConfigRepository::with_apis(apis)),
        throttle,
        sleeper.clone(),
    );
    Harness {
        requests,
        sleeper,
        executor,
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(vec![api(GEOLOCATE_API, 3), api(ROUTING_API, 2)])
}

type Attempt = futures::future::Ready<Result<u32, ExternalCallError>>;

/// Operation failing `failures` times with a transport error, then
/// succeeding with the attempt number.
fn flaky(
    failures: u32,
) -> (
    Arc<AtomicU32>,
    impl Fn(ApiEndpoint) -> Attempt + Send + Sync + 'static,
) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let operation = move |_endpoint: ApiEndpoint| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        futures::future::ready(if attempt <= failures {
            Err(ExternalCallError::transport("connection reset"))
        } else {
            Ok(attempt)
        })
    };
    (calls, operation)
}

#[rstest]
#[tokio::test]
async fn first_success_finishes_the_record(harness: Harness) {
    let (calls, operation) = flaky(0);

    let value = harness
        .executor
        .execute(GEOLOCATE_API, operation)
        .await
        .expect("success");

    assert_eq!(value, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let records = harness.requests.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ApiRequestStatus::Finished);
    assert!(harness.sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test]
async fn retries_with_double_delay_backoff(harness: Harness) {
    let (calls, operation) = flaky(2);

    let value = harness
        .executor
        .execute(GEOLOCATE_API, operation)
        .await
        .expect("third attempt succeeds");

    assert_eq!(value, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        harness.sleeper.recorded(),
        vec![Duration::from_secs(1), Duration::from_secs(1)]
    );
    assert_eq!(harness.requests.records()[0].status, ApiRequestStatus::Finished);
}

#[rstest]
#[tokio::test]
async fn exhaustion_marks_error_and_reports_unavailable(harness: Harness) {
    let (calls, operation) = flaky(u32::MAX);

    let error = harness
        .executor
        .execute(ROUTING_API, operation)
        .await
        .expect_err("all attempts fail");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(error.message().contains("try again later"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.sleeper.recorded().len(), 1, "no back-off after the last attempt");
    assert_eq!(harness.requests.records()[0].status, ApiRequestStatus::Error);
}

#[rstest]
#[tokio::test]
async fn not_routable_propagates_without_retrying(harness: Harness) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let error = harness
        .executor
        .execute(ROUTING_API, move |_endpoint| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ExternalCallError::not_routable()) }
        })
        .await
        .expect_err("terminal");

    assert_eq!(error.code(), ErrorCode::NotRoutable);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(harness.sleeper.recorded().is_empty());
    assert_eq!(harness.requests.records()[0].status, ApiRequestStatus::Error);
}

#[rstest]
#[tokio::test]
async fn operation_receives_configured_endpoint(harness: Harness) {
    let endpoint = harness
        .executor
        .execute(ROUTING_API, |endpoint| async move { Ok(endpoint) })
        .await
        .expect("success");

    assert_eq!(endpoint.api_name, ROUTING_API);
    assert_eq!(endpoint.base_url, "https://routing.invalid/");
    assert_eq!(endpoint.credential, "key");
}

#[rstest]
#[tokio::test]
async fn zero_attempt_budget_still_tries_once() {
    let harness = harness_with(vec![api(GEOLOCATE_API, 0)]);
    let (calls, operation) = flaky(0);

    harness
        .executor
        .execute(GEOLOCATE_API, operation)
        .await
        .expect("success");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn unknown_api_is_a_configuration_error(harness: Harness) {
    let (calls, operation) = flaky(0);

    let error = harness
        .executor
        .execute("Weather", operation)
        .await
        .expect_err("not configured");

    assert_eq!(error.code(), ErrorCode::Misconfigured);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(harness.requests.records().is_empty());
}

#[rstest]
#[tokio::test]
async fn panicking_operation_leaves_no_waiting_record(harness: Harness) {
    let error = harness
        .executor
        .execute(GEOLOCATE_API, |_endpoint| async {
            if true {
                panic!("adapter bug");
            }
            Ok::<(), ExternalCallError>(())
        })
        .await
        .expect_err("panic is contained");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(harness.requests.waiting_count(), 0);
    assert_eq!(harness.requests.records()[0].status, ApiRequestStatus::Error);
}

#[rstest]
#[tokio::test]
async fn abandoned_caller_does_not_strand_the_record(harness: Harness) {
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let release_rx = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));

    let executor = harness.executor.clone();
    let caller = tokio::spawn(async move {
        executor
            .execute(GEOLOCATE_API, move |_endpoint| {
                let release_rx = release_rx.clone();
                async move {
                    if let Some(rx) = release_rx.lock().await.take() {
                        let _ = rx.await;
                    }
                    Ok::<(), ExternalCallError>(())
                }
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    caller.abort();
    let _ = caller.await;
    release_tx.send(()).expect("operation still running");

    for _ in 0..100 {
        if harness.requests.waiting_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(harness.requests.records()[0].status, ApiRequestStatus::Finished);
}
