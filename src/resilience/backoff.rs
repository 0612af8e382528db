//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`, capped at
/// `max`, plus up to 10% jitter. Attempt 0 means no delay.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis().min(u64::MAX as u128) as u64;
    let max_ms = max.as_millis().min(u64::MAX as u128) as u64;

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped_ms = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_ms + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_growth_and_cap() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(1000);

        assert_eq!(calculate_backoff(0, base, max), Duration::ZERO);

        let first = calculate_backoff(1, base, max);
        assert!(first >= base && first < Duration::from_millis(110));

        let second = calculate_backoff(2, base, max);
        assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(220));

        let capped = calculate_backoff(30, base, max);
        assert!(capped >= max && capped < Duration::from_millis(1100));
    }
}
