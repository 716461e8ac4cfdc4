// src/scheduler.rs

//! The external scheduling collaborator.
//!
//! The limiters never block and never sleep. Waiting is expressed by handing
//! a job back to the scheduler with a delay, so the host event loop stays in
//! charge of when anything actually runs.

// dependencies
use std::time::Duration;

use tokio::runtime::Handle;

/// A unit of deferred work handed to the scheduler.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler trait to abstract the host event loop.
/// Implementors must be thread-safe (Send + Sync).
/// Both methods register the job and return immediately; a conforming
/// implementation never runs the job on the caller's stack. Delays are a
/// lower bound, subject to the host's timer granularity.
pub trait Scheduler: Send + Sync {
    /// Run `job` at the earliest opportunity.
    fn run_soon(&self, job: Job);

    /// Run `job` no earlier than `delay` from now.
    fn run_after(&self, delay: Duration, job: Job);
}

/// Scheduler implementation over a tokio runtime handle.
///
/// The handle is injected explicitly; there is no ambient runtime lookup.
///
/// ```no_run
/// use soft_throttle::TokioScheduler;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let scheduler = TokioScheduler::new(runtime.handle().clone());
/// ```
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Create a scheduler that spawns onto the given runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn run_soon(&self, job: Job) {
        self.handle.spawn(async move {
            job();
        });
    }

    fn run_after(&self, delay: Duration, job: Job) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });
    }
}
