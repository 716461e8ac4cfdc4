// tests/throttle/fixtures/test_clock.rs

// dependencies
use soft_throttle::{Clock, ClockError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// Test clock implementation
#[derive(Debug, Clone)]
pub struct TestClock {
    time: Arc<AtomicU64>, // Store as nanos
    should_fail: Arc<AtomicBool>,
}

impl TestClock {
    pub fn new(initial_time: f64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new((initial_time * 1_000_000_000.0) as u64)),
            should_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn advance(&self, seconds: f64) {
        let nanos = (seconds * 1_000_000_000.0) as u64;
        self.time.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn set_time(&self, seconds: f64) {
        let nanos = (seconds * 1_000_000_000.0) as u64;
        self.time.store(nanos, Ordering::Relaxed);
    }

    // Make the next call to `now()` return an error
    pub fn fail_next_call(&self) {
        self.should_fail.store(true, Ordering::Relaxed);
    }

    // Raw nanosecond accessors, used by the manual scheduler
    pub fn now_nanos(&self) -> u64 {
        self.time.load(Ordering::Relaxed)
    }

    pub fn set_nanos(&self, nanos: u64) {
        self.time.store(nanos, Ordering::Relaxed);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Result<u64, ClockError> {
        if self.should_fail.swap(false, Ordering::Relaxed) {
            Err(ClockError::SystemTimeError)
        } else {
            Ok(self.time.load(Ordering::Relaxed))
        }
    }
}
