// tests/throttle/fixtures/manual_scheduler.rs

// dependencies
use soft_throttle::{Job, Scheduler};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::test_clock::TestClock;

// A deterministic scheduler. Jobs queue with a due time and only run when a
// test drains them; draining walks the queue in (due, submission) order and
// moves the shared TestClock forward to each job's due time, so retry chains
// play out exactly as the limiter scheduled them.
pub struct ManualScheduler {
    clock: TestClock,
    queue: Mutex<Vec<QueuedJob>>,
    seq: AtomicU64,
}

struct QueuedJob {
    due: u64,
    seq: u64,
    job: Job,
}

impl ManualScheduler {
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            queue: Mutex::new(Vec::new()),
            seq: AtomicU64::new(0),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    // Run queued jobs in due order until none remain, advancing the clock as
    // needed. Returns the number of jobs executed.
    pub fn run_until_idle(&self) -> usize {
        self.drain(u64::MAX)
    }

    // Run jobs due at or before `deadline_secs`, then park the clock there.
    pub fn run_until(&self, deadline_secs: f64) -> usize {
        let deadline = (deadline_secs * 1_000_000_000.0) as u64;
        let executed = self.drain(deadline);
        if self.clock.now_nanos() < deadline {
            self.clock.set_nanos(deadline);
        }
        executed
    }

    fn push(&self, due: u64, job: Job) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().unwrap().push(QueuedJob { due, seq, job });
    }

    // earliest (due, seq) entry not past the deadline, removed from the queue
    fn pop_due(&self, deadline: u64) -> Option<QueuedJob> {
        let mut queue = self.queue.lock().unwrap();
        let index = queue
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= deadline)
            .min_by_key(|(_, entry)| (entry.due, entry.seq))
            .map(|(index, _)| index)?;
        Some(queue.swap_remove(index))
    }

    fn drain(&self, deadline: u64) -> usize {
        let mut executed = 0;
        // the job runs outside the queue lock: it may schedule more work
        while let Some(next) = self.pop_due(deadline) {
            if next.due > self.clock.now_nanos() {
                self.clock.set_nanos(next.due);
            }
            (next.job)();
            executed += 1;
            assert!(executed < 10_000, "scheduler did not quiesce");
        }
        executed
    }
}

impl Scheduler for ManualScheduler {
    fn run_soon(&self, job: Job) {
        self.push(self.clock.now_nanos(), job);
    }

    fn run_after(&self, delay: Duration, job: Job) {
        let delay = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        self.push(self.clock.now_nanos().saturating_add(delay), job);
    }
}
