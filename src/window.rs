// src/window.rs

// soft-throttle: fixed accounting windows and the call-wrapping protocol.

// dependencies
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::bucket::Admission;
use crate::clock::{Clock, SystemClock, nanos_to_duration};
use crate::config::ThrottleConfig;
use crate::errors::ThrottleError;
use crate::scheduler::{Job, Scheduler};

// the per-window accounting cell
#[derive(Debug)]
struct WindowState {
    window_start: u64,
    spent: u64,
}

struct Inner<C> {
    quota: u64,
    window_nanos: u64,
    state: Mutex<WindowState>,
    clock: C,
    scheduler: Arc<dyn Scheduler>,
}

/// A rate limiter over fixed-length accounting windows.
///
/// Time is partitioned into windows of one `period`; within a window at most
/// `quota` units of cost may be spent. A call that does not fit the remaining
/// window budget is deferred to the start of the next window rather than
/// rejected. Windows rotate lazily, on the next attempted call — an idle
/// limiter does not catch up on missed rotations.
///
/// The limiter shares the bucket's collaborators (a [`Clock`] and a
/// [`Scheduler`]) and the bucket-shaped [`ThrottleConfig`] vocabulary, but
/// keeps its own window accounting; the config's `capacity` is not consulted,
/// the per-window quota is the ceiling.
///
/// Cloning is cheap and clones share the same window.
pub struct FixedWindowLimiter<C = SystemClock>
where
    C: Clock,
{
    inner: Arc<Inner<C>>,
}

impl<C> Clone for FixedWindowLimiter<C>
where
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// methods for the FixedWindowLimiter type
impl<C> FixedWindowLimiter<C>
where
    C: Clock,
{
    /// Create a limiter from a config object, an injected clock, and the
    /// scheduler collaborator. The first window starts at construction time.
    pub fn with_config(
        config: ThrottleConfig,
        clock: C,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ThrottleError> {
        config.validate()?;
        let now = clock.now().map_err(ThrottleError::Clock)?;
        Ok(Self {
            inner: Arc::new(Inner {
                quota: config.quota,
                window_nanos: config.period_nanos(),
                state: Mutex::new(WindowState {
                    window_start: now,
                    spent: 0,
                }),
                clock,
                scheduler,
            }),
        })
    }

    // accessor method to return the per-window quota
    pub fn quota(&self) -> u64 {
        self.inner.quota
    }

    // accessor method to return the window length
    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.inner.window_nanos)
    }

    /// Admission decision for `cost` against the current window.
    ///
    /// Rotates the window first when it has expired. Unlike the bucket, a
    /// `Granted` decision debits nothing here: the window's spend is recorded
    /// when the admitted call actually executes.
    pub fn check(&self, cost: u64) -> Result<Admission, ThrottleError> {
        if cost > self.inner.quota {
            return Err(ThrottleError::CapacityExceeded {
                requested: cost,
                capacity: self.inner.quota,
            });
        }
        let now = self.inner.clock.now().map_err(ThrottleError::Clock)?;
        Ok(self.admit(cost, now))
    }

    fn lock_state(&self) -> MutexGuard<'_, WindowState> {
        // a poisoned lock only means some job panicked; the counters are still usable
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // rotation and admission as one step under the lock
    fn admit(&self, cost: u64, now: u64) -> Admission {
        let mut state = self.lock_state();
        if now.saturating_sub(state.window_start) >= self.inner.window_nanos {
            trace!("window rotated");
            state.window_start = now;
            state.spent = 0;
        }
        let remaining = self.inner.quota.saturating_sub(state.spent);
        if cost <= remaining {
            return Admission::Granted;
        }
        let window_end = state.window_start.saturating_add(self.inner.window_nanos);
        Admission::RetryAfter(nanos_to_duration(u128::from(
            window_end.saturating_sub(now),
        )))
    }
}

impl<C> FixedWindowLimiter<C>
where
    C: Clock + 'static,
{
    /// Wrap `target` so that each invocation spends `cost` of the window
    /// quota, deferring to the next window when the current one is short.
    pub fn throttle<F>(&self, cost: u64, target: F) -> Throttled<F, C>
    where
        F: Send + Sync + 'static,
    {
        Throttled {
            limiter: self.clone(),
            cost,
            target: Arc::new(target),
        }
    }

    // entry point from Throttled::call
    fn submit(&self, cost: u64, destination: Job) -> Result<(), ThrottleError> {
        if cost > self.inner.quota {
            return Err(ThrottleError::CapacityExceeded {
                requested: cost,
                capacity: self.inner.quota,
            });
        }
        let now = self.inner.clock.now().map_err(ThrottleError::Clock)?;
        self.dispatch(cost, destination, now);
        Ok(())
    }

    fn dispatch(&self, cost: u64, destination: Job, now: u64) {
        match self.admit(cost, now) {
            Admission::Granted => {
                trace!(cost, "window admits call");
                let limiter = self.clone();
                self.inner
                    .scheduler
                    .run_soon(Box::new(move || limiter.record_and_run(cost, destination)));
            }
            Admission::RetryAfter(delay) => {
                debug!(
                    cost,
                    delay_ms = delay.as_millis() as u64,
                    "window budget short, deferring to next window"
                );
                let limiter = self.clone();
                self.inner.scheduler.run_after(
                    delay,
                    Box::new(move || limiter.redrive(cost, destination, delay)),
                );
            }
        }
    }

    // a woken re-attempt re-enters rotation with a fresh clock read
    fn redrive(&self, cost: u64, destination: Job, last_delay: Duration) {
        match self.inner.clock.now() {
            Ok(now) => self.dispatch(cost, destination, now),
            Err(_) => {
                // nobody to report to out here; try again after the same wait
                warn!(cost, "clock failed during re-attempt, deferring again");
                let limiter = self.clone();
                self.inner.scheduler.run_after(
                    last_delay,
                    Box::new(move || limiter.redrive(cost, destination, last_delay)),
                );
            }
        }
    }

    // execution prologue: the spend lands when the call runs, not when it was admitted
    fn record_and_run(&self, cost: u64, destination: Job) {
        {
            let mut state = self.lock_state();
            state.spent = state.spent.saturating_add(cost);
        }
        destination();
    }
}

/// A throttled wrapper around a callable, produced by
/// [`FixedWindowLimiter::throttle`].
///
/// Cloning is cheap; clones share the limiter and the target.
pub struct Throttled<F, C = SystemClock>
where
    C: Clock,
{
    limiter: FixedWindowLimiter<C>,
    cost: u64,
    target: Arc<F>,
}

impl<F, C> Clone for Throttled<F, C>
where
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            cost: self.cost,
            target: Arc::clone(&self.target),
        }
    }
}

impl<F, C> Throttled<F, C>
where
    C: Clock + 'static,
{
    /// Invoke the wrapped callable with `args`, subject to the window quota.
    ///
    /// Returns as soon as the call is registered with the scheduler; the
    /// target's own return value is discarded, since execution is deferred.
    /// Fails synchronously with [`ThrottleError::CapacityExceeded`] when the
    /// cost can never fit a window.
    ///
    /// Admission is checked at call time but the spend is recorded when the
    /// call executes, so two calls admitted back-to-back before either has
    /// run can overshoot a window's quota; the next rotation settles it.
    pub fn call<A, R>(&self, args: A) -> Result<(), ThrottleError>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        A: Send + 'static,
    {
        let target = Arc::clone(&self.target);
        let destination: Job = Box::new(move || {
            (*target)(args);
        });
        self.limiter.submit(self.cost, destination)
    }
}
