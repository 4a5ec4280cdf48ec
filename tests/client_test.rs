use std::time::Duration;

use reqwest::StatusCode;
use sporgcli::spotify::client::RetryPolicy;

#[test]
fn transient_status_classification() {
    for code in [429u16, 500, 502, 503, 504] {
        let status = StatusCode::from_u16(code).unwrap();
        assert!(RetryPolicy::is_transient(status), "{} should be transient", code);
    }

    for code in [200u16, 201, 400, 401, 403, 404] {
        let status = StatusCode::from_u16(code).unwrap();
        assert!(!RetryPolicy::is_transient(status), "{} should not be transient", code);
    }
}

#[test]
fn backoff_doubles_within_the_window() {
    let policy = RetryPolicy {
        max_attempts: 5,
        min_delay: Duration::from_secs(4),
        max_delay: Duration::from_secs(10),
    };

    assert_eq!(policy.delay_for(1, None), Duration::from_secs(4));
    assert_eq!(policy.delay_for(2, None), Duration::from_secs(8));
    // clamped at the window's upper bound from here on
    assert_eq!(policy.delay_for(3, None), Duration::from_secs(10));
    assert_eq!(policy.delay_for(6, None), Duration::from_secs(10));
}

#[test]
fn retry_after_hint_overrides_backoff() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.delay_for(1, Some(30)), Duration::from_secs(30));
    assert_eq!(policy.delay_for(4, Some(0)), Duration::from_secs(0));
}

#[test]
fn abnormal_retry_after_is_ignored() {
    let policy = RetryPolicy::default();

    // anything above two minutes falls back to the computed backoff
    assert_eq!(policy.delay_for(1, Some(600)), Duration::from_secs(4));
}

#[test]
fn default_policy_matches_tuning_constants() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.min_delay, Duration::from_secs(4));
    assert_eq!(policy.max_delay, Duration::from_secs(10));
}
