// src/clock.rs

// clock module definition and implementations

// dependencies
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Clock trait to abstract time retrieval.
/// Implementors must be thread-safe (Send + Sync).
/// The `now` method returns the current time in nanoseconds as a u64.
/// This trait allows for different clock implementations, such as system time or a test clock.
/// Both limiters read the clock through this trait and never directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<u64, ClockError>;
}

/// Clock error type
#[derive(Debug)]
pub enum ClockError {
    SystemTimeError,
}

/// SystemClock implementation using the system time.
/// Returns the current time in nanoseconds since the Unix epoch.
/// Errors if the system clock is before the Unix epoch.
/// This is the default clock used by both limiters.
#[derive(Debug, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<u64, ClockError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .map_err(|_| ClockError::SystemTimeError)
    }
}

// Make SystemClock the default
impl Default for SystemClock {
    fn default() -> Self {
        Self
    }
}

// internal helper to convert a duration to whole nanoseconds, saturating at u64::MAX
pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

// internal helper to convert a nanosecond count back into a duration
pub(crate) fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
