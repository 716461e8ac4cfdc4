// tests/throttle/config_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::manual_scheduler::ManualScheduler;
    use crate::fixtures::test_clock::TestClock;
    use soft_throttle::{ThrottleConfig, ThrottleError, TokenBucket};
    use std::sync::Arc;
    use std::time::Duration;

    // Config validation tests
    #[test]
    fn config_rejects_zero_period() {
        let config = ThrottleConfig::new(5, Duration::ZERO);
        let result = config.validate();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ThrottleError::InvalidPeriod));
    }

    #[test]
    fn config_accepts_valid_parameters() {
        let config = ThrottleConfig::new(5, Duration::from_secs(1)).capacity(10);
        let result = config.validate();
        assert!(result.is_ok());
    }

    #[test]
    fn config_accepts_zero_quota() {
        // a zero quota is legal: it disables accounting entirely
        let config = ThrottleConfig::new(0, Duration::from_secs(1)).capacity(10);
        assert!(config.validate().is_ok());
    }

    // Test config builder pattern
    #[test]
    fn config_builder_pattern_works() {
        let config = ThrottleConfig::new(0, Duration::ZERO)
            .quota(10)
            .period(Duration::from_secs(2))
            .capacity(5);

        assert!(config.validate().is_ok());

        let clock = TestClock::new(0.0);
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let bucket = TokenBucket::with_config(config, clock, scheduler).unwrap();
        assert_eq!(bucket.quota(), 10);
        assert_eq!(bucket.period(), Duration::from_secs(2));
        assert_eq!(bucket.capacity(), Some(5));
    }

    #[test]
    fn config_unbounded_clears_the_capacity() {
        let config = ThrottleConfig::new(1, Duration::from_secs(1))
            .capacity(5)
            .unbounded();

        let clock = TestClock::new(0.0);
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let bucket = TokenBucket::with_config(config, clock, scheduler).unwrap();
        assert_eq!(bucket.capacity(), None);
    }

    // Constructor tests with config
    #[test]
    fn constructor_with_invalid_config_fails() {
        let clock = TestClock::new(0.0);
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let config = ThrottleConfig::new(5, Duration::ZERO);
        let result = TokenBucket::with_config(config, clock, scheduler);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ThrottleError::InvalidPeriod));
    }

    #[test]
    fn constructor_with_valid_config_succeeds() {
        let clock = TestClock::new(0.0);
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let config = ThrottleConfig::new(5, Duration::from_secs(1)).capacity(5);
        let result = TokenBucket::with_config(config, clock, scheduler);
        assert!(result.is_ok());
    }
}
