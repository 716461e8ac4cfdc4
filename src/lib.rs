// src/lib.rs

//! # Soft Throttle
//!
//! A cooperative rate limiter that defers calls instead of rejecting them.
//!
//! Work is admitted against a budget of abstract units that replenishes over
//! time. When the budget is short, the call is re-scheduled on the host event
//! loop rather than dropped: every admitted call eventually runs. Two layered
//! primitives are provided — a [`TokenBucket`] with a continuously refilling
//! budget, and a [`FixedWindowLimiter`] that spends a fixed quota per time
//! window and defers overflow to the next window.
//!
//! Both depend only on two injected collaborators: a [`Clock`] and a
//! [`Scheduler`] (run-now / run-after-delay). [`TokioScheduler`] implements
//! the latter over a tokio runtime handle.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use soft_throttle::{FixedWindowLimiter, SystemClock, ThrottleConfig, TokioScheduler};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let scheduler = Arc::new(TokioScheduler::new(runtime.handle().clone()));
//!
//! // at most two calls' worth of cost per second
//! let config = ThrottleConfig::new(2, Duration::from_secs(1));
//! let limiter = FixedWindowLimiter::with_config(config, SystemClock, scheduler).unwrap();
//!
//! let throttled = limiter.throttle(1, |name: &str| println!("hello, {name}"));
//! throttled.call("world").unwrap();
//! ```

// private modules
mod bucket;
mod clock;
mod config;
mod errors;
mod scheduler;
mod window;

// public API exports
pub use bucket::{Admission, TokenBucket};
pub use clock::{Clock, ClockError, SystemClock};
pub use config::ThrottleConfig;
pub use errors::ThrottleError;
pub use scheduler::{Job, Scheduler, TokioScheduler};
pub use window::{FixedWindowLimiter, Throttled};
