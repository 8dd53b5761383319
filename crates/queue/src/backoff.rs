use std::time::Duration;

/// `base * 2^(attempt-1)`, capped at `max`. `attempt` is the attempt
/// number that just failed (1-indexed), so the first retry (after attempt
/// 1 fails) waits `base`, the second waits `2*base`, and so on.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    let multiplier = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let scaled = base.as_millis().min(u128::from(u64::MAX) as u128) as u64;
    let delay_ms = scaled.saturating_mul(multiplier);
    Duration::from_millis(delay_ms).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_waits_exactly_base() {
        let delay = backoff_delay(1, Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(delay, Duration::from_millis(100));
    }

    #[test]
    fn second_retry_waits_double_base() {
        let delay = backoff_delay(2, Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(delay, Duration::from_millis(200));
    }

    #[test]
    fn third_retry_waits_quadruple_base() {
        let delay = backoff_delay(3, Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(delay, Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let delay = backoff_delay(20, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(delay, Duration::from_secs(1));
    }

    #[test]
    fn huge_attempt_counts_never_overflow() {
        let delay = backoff_delay(u32::MAX, Duration::from_millis(100), Duration::from_secs(30));
        assert_eq!(delay, Duration::from_secs(30));
    }
}
