// src/config.rs

//! Configuration types for the throttle limiters

// dependencies
use std::time::Duration;

use crate::clock::duration_to_nanos;
use crate::errors::ThrottleError;

/// Configuration shared by [`TokenBucket`](crate::TokenBucket) and
/// [`FixedWindowLimiter`](crate::FixedWindowLimiter).
///
/// `quota` units of budget are restored every `period`. `capacity` bounds the
/// budget a bucket can hold; a bucket built without one admits everything
/// immediately and performs no accounting. The fixed-window limiter reads
/// `quota` and `period` only (the per-window quota is its ceiling).
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub(crate) capacity: Option<u64>,
    pub(crate) quota: u64,
    pub(crate) period: Duration,
}

impl ThrottleConfig {
    /// Create a new configuration restoring `quota` units every `period`,
    /// with no capacity bound.
    pub fn new(quota: u64, period: Duration) -> Self {
        Self {
            capacity: None,
            quota,
            period,
        }
    }

    /// Builder-style: bound the budget at `capacity` units
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Builder-style: remove the capacity bound (admit everything)
    pub fn unbounded(mut self) -> Self {
        self.capacity = None;
        self
    }

    /// Builder-style: set the restored quota per period
    pub fn quota(mut self, quota: u64) -> Self {
        self.quota = quota;
        self
    }

    /// Builder-style: set the refill period / window length
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ThrottleError> {
        if self.period.is_zero() || self.period.as_nanos() > u64::MAX as u128 {
            return Err(ThrottleError::InvalidPeriod);
        }
        Ok(())
    }

    // the period in whole nanoseconds; callers run validate() first
    pub(crate) fn period_nanos(&self) -> u64 {
        duration_to_nanos(self.period)
    }
}
