use std::time::Duration;

/// Configuration for the exponential backoff schedule. Kept separate from
/// any suspending primitive so the schedule itself is a pure function of
/// `(attempt, config)` — property-testable without a clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    pub base: Duration,
    pub multiplier: f64,
    pub ceiling: Duration,
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            multiplier: 2.0,
            ceiling: Duration::from_secs(60),
            max_retries: 5,
        }
    }
}

/// `base * multiplier^attempt`, clamped at `ceiling`. `attempt` is the
/// retry counter (0 on the first retry). Pure: no I/O, no clock.
pub fn backoff_delay(attempt: u32, config: &BackoffConfig) -> Duration {
    let factor = config.multiplier.powi(attempt as i32);
    let millis = (config.base.as_secs_f64() * 1000.0 * factor).min(config.ceiling.as_millis() as f64);
    Duration::from_millis(millis.max(0.0) as u64)
}

/// Whether the retry counter has exceeded the configured ceiling for one
/// logical operation; once true the caller must surface a terminal error.
pub fn retries_exhausted(attempt: u32, config: &BackoffConfig) -> bool {
    attempt >= config.max_retries
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_attempt_is_base_delay() {
        let config = BackoffConfig::default();
        assert_eq!(backoff_delay(0, &config), config.base);
    }

    #[test]
    fn grows_by_multiplier_until_ceiling() {
        let config = BackoffConfig { ceiling: Duration::from_secs(3600), ..Default::default() };
        let d0 = backoff_delay(0, &config);
        let d1 = backoff_delay(1, &config);
        assert!(d1 > d0);
        assert_eq!(d1, d0 * 2);
    }

    proptest! {
        #[test]
        fn never_exceeds_ceiling(attempt in 0u32..64, base_ms in 1u64..5000, mult in 1.0f64..4.0, ceiling_ms in 1u64..120_000) {
            let config = BackoffConfig {
                base: Duration::from_millis(base_ms),
                multiplier: mult,
                ceiling: Duration::from_millis(ceiling_ms),
                max_retries: 10,
            };
            let delay = backoff_delay(attempt, &config);
            prop_assert!(delay <= config.ceiling);
        }

        #[test]
        fn monotone_nondecreasing_in_attempt(base_ms in 1u64..5000, mult in 1.0f64..4.0, ceiling_ms in 1u64..120_000) {
            let config = BackoffConfig {
                base: Duration::from_millis(base_ms),
                multiplier: mult,
                ceiling: Duration::from_millis(ceiling_ms),
                max_retries: 10,
            };
            let mut prev = backoff_delay(0, &config);
            for attempt in 1..20 {
                let next = backoff_delay(attempt, &config);
                prop_assert!(next >= prev);
                prev = next;
            }
        }
    }
}
