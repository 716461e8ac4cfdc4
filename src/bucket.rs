// src/bucket.rs

// soft-throttle: the replenishing token budget and its defer-and-retry loop.

// dependencies
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock, nanos_to_duration};
use crate::config::ThrottleConfig;
use crate::errors::ThrottleError;
use crate::scheduler::{Job, Scheduler};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may run now.
    Granted,
    /// Not enough budget yet; re-check after the delay.
    RetryAfter(Duration),
}

// the mutable accounting cell, one per bucket
#[derive(Debug)]
struct BucketState {
    consumed: u64,
    last_refill: u64,
}

struct Inner<C> {
    capacity: Option<u64>,
    quota: u64,
    period_nanos: u64,
    state: Mutex<BucketState>,
    clock: C,
    scheduler: Arc<dyn Scheduler>,
}

/// A budget of abstract units that replenishes over time.
///
/// `quota` units accrue per `period`, up to `capacity`. A bucket built without
/// a capacity is unbounded: every call is admitted immediately and no
/// accounting is kept. Admission checks a requested `cost` against the current
/// level, but each admitted call debits exactly one unit.
///
/// The bucket never blocks. [`burn`](TokenBucket::burn) registers the work
/// with the injected [`Scheduler`] and returns; when the budget is short, the
/// attempt is re-scheduled after a computed delay and checked again from
/// scratch.
///
/// Cloning is cheap and clones share the same budget.
pub struct TokenBucket<C = SystemClock>
where
    C: Clock,
{
    inner: Arc<Inner<C>>,
}

impl<C> Clone for TokenBucket<C>
where
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// methods for the TokenBucket type
impl<C> TokenBucket<C>
where
    C: Clock,
{
    /// Create a bucket from a config object, an injected clock, and the
    /// scheduler collaborator.
    pub fn with_config(
        config: ThrottleConfig,
        clock: C,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ThrottleError> {
        config.validate()?;
        // an unbounded bucket keeps no accounts, so it never reads the clock
        let last_refill = match config.capacity {
            Some(_) => clock.now().map_err(ThrottleError::Clock)?,
            None => 0,
        };
        Ok(Self {
            inner: Arc::new(Inner {
                capacity: config.capacity,
                quota: config.quota,
                period_nanos: config.period_nanos(),
                state: Mutex::new(BucketState {
                    consumed: 0,
                    last_refill,
                }),
                clock,
                scheduler,
            }),
        })
    }

    // accessor method to return the capacity bound, if any
    pub fn capacity(&self) -> Option<u64> {
        self.inner.capacity
    }

    // accessor method to return the restored quota per period
    pub fn quota(&self) -> u64 {
        self.inner.quota
    }

    // accessor method to return the refill period
    pub fn period(&self) -> Duration {
        Duration::from_nanos(self.inner.period_nanos)
    }

    /// Currently available budget with accrued refill folded in, or `None`
    /// when the bucket is unbounded.
    pub fn level(&self) -> Result<Option<u64>, ThrottleError> {
        let Some(capacity) = self.inner.capacity else {
            return Ok(None);
        };
        let now = self.inner.clock.now().map_err(ThrottleError::Clock)?;
        let mut state = self.lock_state();
        self.refill(&mut state, capacity, now);
        Ok(Some(capacity - state.consumed))
    }

    /// Admission decision for `cost`, as a value.
    ///
    /// A `Granted` result has already debited the per-call unit; the caller is
    /// expected to go on and run the admitted work. `RetryAfter` carries the
    /// time needed for the missing budget to accrue at the current refill
    /// rate. A cost above the bucket's capacity can never be satisfied and
    /// fails with [`ThrottleError::CapacityExceeded`], whatever the current
    /// consumption state.
    pub fn check(&self, cost: u64) -> Result<Admission, ThrottleError> {
        let Some(capacity) = self.inner.capacity else {
            return Ok(Admission::Granted);
        };
        if cost > capacity {
            return Err(ThrottleError::CapacityExceeded {
                requested: cost,
                capacity,
            });
        }
        let now = self.inner.clock.now().map_err(ThrottleError::Clock)?;
        Ok(self.admit(capacity, cost, now))
    }

    fn lock_state(&self) -> MutexGuard<'_, BucketState> {
        // a poisoned lock only means some job panicked; the counters are still usable
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // fold accrued budget into the level; setting the level writes
    // consumed = capacity - level
    fn refill(&self, state: &mut BucketState, capacity: u64, now: u64) {
        if self.inner.quota == 0 {
            // accounting disabled: the bucket is always full
            state.consumed = 0;
            return;
        }
        let elapsed = now.saturating_sub(state.last_refill);
        let accrued = (elapsed as u128 * self.inner.quota as u128) / self.inner.period_nanos as u128;
        let accrued = u64::try_from(accrued).unwrap_or(u64::MAX);
        let level = (capacity - state.consumed)
            .saturating_add(accrued)
            .min(capacity);
        state.consumed = capacity - level;
        state.last_refill = now;
    }

    // one admission step: refill, then grant or compute the catch-up delay
    fn admit(&self, capacity: u64, cost: u64, now: u64) -> Admission {
        let mut state = self.lock_state();
        self.refill(&mut state, capacity, now);
        let level = capacity - state.consumed;
        if cost <= level {
            // threshold check is on cost, but each admitted call burns one unit
            state.consumed = state.consumed.saturating_add(1).min(capacity);
            return Admission::Granted;
        }
        // quota is nonzero here: a zero quota leaves the bucket full after
        // refill, and cost is already bounded by capacity
        let missing = cost - level;
        // round up so a re-attempt never wakes before the budget can exist
        let delay =
            (missing as u128 * self.inner.period_nanos as u128).div_ceil(self.inner.quota as u128);
        Admission::RetryAfter(nanos_to_duration(delay))
    }
}

impl<C> TokenBucket<C>
where
    C: Clock + 'static,
{
    /// Burn `cost` units of budget, running `on_ready` once admitted.
    ///
    /// Returns as soon as the work is registered with the scheduler. A short
    /// budget re-schedules the attempt after the computed delay; each
    /// re-attempt refills and decides again, so racing burns on a shared
    /// bucket only shift the wait, they never lose the call.
    pub fn burn<F>(&self, cost: u64, on_ready: F) -> Result<(), ThrottleError>
    where
        F: FnOnce() + Send + 'static,
    {
        match self.check(cost)? {
            Admission::Granted => {
                trace!(cost, "admitted");
                self.inner.scheduler.run_soon(Box::new(on_ready));
            }
            Admission::RetryAfter(delay) => self.defer(cost, Box::new(on_ready), delay),
        }
        Ok(())
    }

    fn defer(&self, cost: u64, on_ready: Job, delay: Duration) {
        debug!(cost, delay_ms = delay.as_millis() as u64, "budget short, deferring");
        let bucket = self.clone();
        self.inner.scheduler.run_after(
            delay,
            Box::new(move || bucket.redrive(cost, on_ready, delay)),
        );
    }

    // a woken re-attempt: decide again with a fresh clock read
    fn redrive(&self, cost: u64, on_ready: Job, last_delay: Duration) {
        let now = match self.inner.clock.now() {
            Ok(now) => now,
            Err(_) => {
                // nobody to report to out here; try again after the same wait
                warn!(cost, "clock failed during re-attempt, deferring again");
                return self.defer(cost, on_ready, last_delay);
            }
        };
        let decision = match self.inner.capacity {
            None => Admission::Granted,
            Some(capacity) => self.admit(capacity, cost, now),
        };
        match decision {
            Admission::Granted => {
                trace!(cost, "admitted after deferral");
                self.inner.scheduler.run_soon(on_ready);
            }
            Admission::RetryAfter(delay) => self.defer(cost, on_ready, delay),
        }
    }
}
