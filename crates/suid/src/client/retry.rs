//! Throttling and backoff for block fetches.
//!
//! A failed fetch is retried only when the allocator answered with a transient
//! server-side status. The delay before a retry comes from the allocator's
//! `Retry-After` hint (five minutes without one) and is then lowered the
//! closer the client is to running dry.

use core::time::Duration;

/// A fetch younger than this is never duplicated.
pub const THROTTLE_WINDOW: Duration = Duration::from_secs(5);

/// Retries granted to a fetch after its first attempt.
pub const RETRY_BUDGET: u32 = 3;

/// Delay before a retry when the allocator gives no hint.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

/// Retry cap while the pool holds no blocks.
pub const EMPTY_POOL_CAP: Duration = Duration::from_secs(60);

/// Retry cap once more than half of the held block is issued.
pub const HALF_CONSUMED_CAP: Duration = Duration::from_secs(30);

/// Retry cap while no block is held at all.
pub const NO_BLOCK_CAP: Duration = Duration::from_secs(2);

/// Grace period between an unsatisfied readiness check and the fetch it
/// triggers, leaving callers time to configure the client first.
pub const READY_GRACE: Duration = Duration::from_millis(100);

/// How close the client is to being unable to issue identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Urgency {
    pub pool_empty: bool,
    pub block_half_consumed: bool,
    pub no_block_held: bool,
}

/// Transient server-side failures worth retrying: internal error, bad
/// gateway, service unavailable and gateway timeout.
pub const fn is_retryable(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

/// Parses a `Retry-After` value given in whole seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Computes the delay before the next attempt.
///
/// The base delay is the `Retry-After` hint, or [`DEFAULT_RETRY_DELAY`] when
/// it is absent or unparsable. Each urgency condition that holds caps it
/// further; none of them ever raises it.
///
/// ```
/// use core::time::Duration;
/// use suid::{Urgency, retry_delay};
///
/// let urgency = Urgency { pool_empty: true, block_half_consumed: false, no_block_held: true };
/// assert_eq!(retry_delay(None, urgency), Duration::from_secs(2));
/// assert_eq!(retry_delay(Some("10"), Urgency::default()), Duration::from_secs(10));
/// ```
pub fn retry_delay(retry_after: Option<&str>, urgency: Urgency) -> Duration {
    let mut delay = retry_after
        .and_then(parse_retry_after)
        .unwrap_or(DEFAULT_RETRY_DELAY);
    if urgency.pool_empty {
        delay = delay.min(EMPTY_POOL_CAP);
    }
    if urgency.block_half_consumed {
        delay = delay.min(HALF_CONSUMED_CAP);
    }
    if urgency.no_block_held {
        delay = delay.min(NO_BLOCK_CAP);
    }
    delay
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn urgency(pool_empty: bool, block_half_consumed: bool, no_block_held: bool) -> Urgency {
        Urgency {
            pool_empty,
            block_half_consumed,
            no_block_held,
        }
    }

    #[test]
    fn classifies_statuses() {
        for status in [500, 502, 503, 504] {
            assert!(is_retryable(status), "{status}");
        }
        for status in [0, 200, 400, 401, 404, 429, 501, 505] {
            assert!(!is_retryable(status), "{status}");
        }
    }

    #[test]
    fn base_delay_comes_from_the_hint() {
        assert_eq!(retry_delay(None, Urgency::default()), DEFAULT_RETRY_DELAY);
        assert_eq!(retry_delay(Some("10"), Urgency::default()), Duration::from_secs(10));
        assert_eq!(retry_delay(Some(" 0 "), Urgency::default()), Duration::ZERO);
        assert_eq!(
            retry_delay(Some("Wed, 21 Oct 2015 07:28:00 GMT"), Urgency::default()),
            DEFAULT_RETRY_DELAY
        );
        assert_eq!(retry_delay(Some("-5"), Urgency::default()), DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn urgency_only_lowers_the_delay() {
        assert_eq!(retry_delay(None, urgency(true, false, false)), EMPTY_POOL_CAP);
        assert_eq!(retry_delay(None, urgency(false, true, false)), HALF_CONSUMED_CAP);
        assert_eq!(retry_delay(None, urgency(true, true, false)), HALF_CONSUMED_CAP);
        assert_eq!(retry_delay(None, urgency(true, false, true)), NO_BLOCK_CAP);
        assert_eq!(retry_delay(None, urgency(true, true, true)), NO_BLOCK_CAP);

        // A short hint is never raised to a cap.
        assert_eq!(
            retry_delay(Some("1"), urgency(true, true, true)),
            Duration::from_secs(1)
        );
        assert_eq!(
            retry_delay(Some("45"), urgency(true, false, false)),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn delay_never_exceeds_any_applicable_cap() {
        for hint in [None, Some("0"), Some("3"), Some("40"), Some("90"), Some("600")] {
            for bits in 0..8_u8 {
                let u = urgency(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
                let delay = retry_delay(hint, u);
                let base = hint.and_then(parse_retry_after).unwrap_or(DEFAULT_RETRY_DELAY);
                assert!(delay <= base);
                assert!(!u.pool_empty || delay <= EMPTY_POOL_CAP);
                assert!(!u.block_half_consumed || delay <= HALF_CONSUMED_CAP);
                assert!(!u.no_block_held || delay <= NO_BLOCK_CAP);
            }
        }
    }
}
