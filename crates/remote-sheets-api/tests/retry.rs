//! Retry policy behavior against a scripted failure source

use std::cell::Cell;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use remote_sheets_api::{
    ApiError, MemoryDocument, MemoryService, MemorySheet, RetryPolicy, SheetsService, Sleeper,
};

/// Records requested sleeps instead of blocking
#[derive(Clone, Default)]
struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn policy(budget: Duration) -> (RetryPolicy, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    (RetryPolicy::new(budget).with_sleeper(sleeper.clone()), sleeper)
}

#[test]
fn test_success_needs_no_sleep() {
    let (policy, sleeper) = policy(Duration::from_secs(200));
    let result: Result<u32, ApiError> = policy.run(|| Ok(7));
    assert_eq!(result.unwrap(), 7);
    assert!(sleeper.sleeps().is_empty());
}

#[test]
fn test_server_errors_are_retried() {
    let (policy, sleeper) = policy(Duration::from_secs(200));
    let attempts = Cell::new(0);

    let result = policy.run(|| {
        attempts.set(attempts.get() + 1);
        if attempts.get() < 4 {
            Err(ApiError::http(500, "backend error"))
        } else {
            Ok("done")
        }
    });

    assert_eq!(result.unwrap(), "done");
    assert_eq!(attempts.get(), 4);

    let sleeps = sleeper.sleeps();
    assert_eq!(sleeps.len(), 3);
    for (i, delay) in sleeps.iter().enumerate() {
        // The Nth retry waits less than 2^N seconds
        assert!(delay.as_secs_f64() <= 2f64.powi(i as i32 + 1));
    }
}

#[test]
fn test_permanent_errors_are_not_retried() {
    let (policy, sleeper) = policy(Duration::from_secs(200));
    let attempts = Cell::new(0);

    let err = policy
        .run(|| -> Result<(), ApiError> {
            attempts.set(attempts.get() + 1);
            Err(ApiError::http(403, "The caller does not have permission"))
        })
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(attempts.get(), 1);
    assert!(sleeper.sleeps().is_empty());
}

#[test]
fn test_daily_quota_propagates_on_first_occurrence() {
    let (policy, _) = policy(Duration::from_secs(200));
    let attempts = Cell::new(0);

    let err = policy
        .run(|| -> Result<(), ApiError> {
            attempts.set(attempts.get() + 1);
            Err(ApiError::rate_limited("Insufficient tokens for quota per 1d"))
        })
        .unwrap_err();

    assert_eq!(err.status(), Some(429));
    assert_eq!(attempts.get(), 1);
}

#[test]
fn test_short_quota_is_retried() {
    let (policy, sleeper) = policy(Duration::from_secs(200));
    let attempts = Cell::new(0);

    let result = policy.run(|| {
        attempts.set(attempts.get() + 1);
        if attempts.get() == 1 {
            Err(ApiError::rate_limited("Insufficient tokens for quota per 100s"))
        } else {
            Ok(())
        }
    });

    assert!(result.is_ok());
    assert_eq!(sleeper.sleeps().len(), 1);
}

#[test]
fn test_timeouts_are_retried() {
    let (policy, _) = policy(Duration::from_secs(200));
    let attempts = Cell::new(0);

    let result = policy.run(|| {
        attempts.set(attempts.get() + 1);
        if attempts.get() < 3 {
            Err(ApiError::Timeout)
        } else {
            Ok(())
        }
    });

    assert!(result.is_ok());
    assert_eq!(attempts.get(), 3);
}

#[test]
fn test_persistent_failure_exhausts_the_budget() {
    let budget = Duration::from_secs(30);
    let (policy, sleeper) = policy(budget);
    let attempts = Cell::new(0u32);

    let err = policy
        .run(|| -> Result<(), ApiError> {
            attempts.set(attempts.get() + 1);
            Err(ApiError::http(503, "unavailable"))
        })
        .unwrap_err();

    // The last failure comes back unchanged
    assert_eq!(err.status(), Some(503));
    assert_eq!(sleeper.total(), budget);
    assert_eq!(attempts.get() as usize, sleeper.sleeps().len() + 1);
}

#[test]
fn test_source_recovering_near_the_end_of_the_budget_succeeds() {
    let budget = Duration::from_secs(30);
    let epsilon = Duration::from_millis(10);
    let (policy, sleeper) = policy(budget);

    let result = policy.run(|| {
        if sleeper.total() + epsilon < budget {
            Err(ApiError::http(500, "backend error"))
        } else {
            Ok("recovered")
        }
    });

    assert_eq!(result.unwrap(), "recovered");
    assert!(sleeper.total() + epsilon >= budget);
    assert!(sleeper.total() <= budget);
}

#[test]
fn test_wrapped_service_call() {
    let service = MemoryService::new().with_document(
        MemoryDocument::new("doc", "Budget").with_sheet(MemorySheet::new("Sheet1", 3, 3)),
    );
    service.fail_next(ApiError::http(502, "bad gateway"));
    service.fail_next(ApiError::Timeout);

    let (policy, sleeper) = policy(Duration::from_secs(200));
    let mut get = policy.wrap(|| service.get_document("doc"));

    let entry = get().unwrap();
    assert_eq!(entry.properties.title, "Budget");
    assert_eq!(service.calls().len(), 3);
    assert_eq!(sleeper.sleeps().len(), 2);
}
