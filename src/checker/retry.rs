// src/checker/retry.rs
// =============================================================================
// Retry policy for manifest probes.
//
// GitHub occasionally answers with 5xx while it is under load. Rather than
// dropping a perfectly good project from the report, we retry those answers
// (and flaky connections) a few times with exponential backoff.
//
// Schedule (factor f, retry number n starting at 1):
//   n = 1   -> retry immediately
//   n >= 2  -> wait f * 2^(n-1) seconds, never more than `max_backoff`
// =============================================================================

use std::time::Duration;

/// Statuses worth a second try.
pub const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.1;
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (so `max_retries + 1` requests at most)
    pub max_retries: u32,
    /// Seconds, multiplied by 2^(n-1)
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Policy that retries without sleeping in between.
    #[cfg(test)]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_factor: 0.0,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn retries_status(&self, status: u16) -> bool {
        RETRY_STATUSES.contains(&status)
    }

    /// Whether another attempt is allowed after `retries_done` retries.
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry <= 1 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let secs = self.backoff_factor * 2f64.powi(retry as i32 - 1);
        // from_secs_f64 panics on overflow, so clamp before converting
        let capped = secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// A server-provided Retry-After wins, but is still capped.
    pub fn delay_with_hint(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(self.max_backoff),
            None => self.delay_for(retry),
        }
    }
}

// Parses a Retry-After header holding a number of seconds.
// HTTP-date values are ignored and fall back to the regular schedule.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
