//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::LinkConfig;

/// Delay before retry number `attempt` (1-based), capped at `max_ms` plus up
/// to 10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff for a forwarded link retry.
pub fn link_backoff(attempt: u32, config: &LinkConfig) -> Duration {
    calculate_backoff(attempt, config.retry_base_delay_ms, config.retry_max_delay_ms)
}
