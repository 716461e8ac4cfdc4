// src/errors.rs

// error handling for the throttle types

// dependencies
use std::error::Error;
use std::fmt;

use crate::clock::ClockError;

/// Error type for throttle configuration and admission issues.
#[non_exhaustive]
#[derive(Debug)]
pub enum ThrottleError {
    // for a zero-length (or wider than u64 nanoseconds) refill period / window
    InvalidPeriod,
    // the requested cost can never fit, no matter how long we wait
    CapacityExceeded { requested: u64, capacity: u64 },
    // error variant for issues with the system clock
    Clock(ClockError),
}

// implement the Display trait for the ThrottleError type
impl fmt::Display for ThrottleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ThrottleError::InvalidPeriod => write!(f, "Period must be a positive duration"),
            ThrottleError::CapacityExceeded {
                requested,
                capacity,
            } => write!(
                f,
                "Requested cost, {}, exceeds capacity, {}",
                requested, capacity
            ),
            ThrottleError::Clock(_) => {
                write!(f, "Clock error occurred")
            }
        }
    }
}

// implement the Error trait for the ThrottleError type
impl Error for ThrottleError {}
