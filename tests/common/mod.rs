//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod recorder;

use std::time::Duration;

/// Upper bound for waiting on pool-driven results
pub fn test_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Assert `actual` is at least `expected` and within `slack` of it
pub fn assert_duration_near(actual: Duration, expected: Duration, slack: Duration) {
    assert!(
        actual + slack >= expected && actual <= expected + slack * 4,
        "Expected {:?} to be within {:?} of {:?}",
        actual,
        slack,
        expected
    );
}
