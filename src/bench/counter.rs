//! Hot-path iteration counter.
//!
//! A workload drives a [`Bencher`] in a loop:
//!
//! ```ignore
//! while b.next() {
//!     black_box(work());
//! }
//! ```
//!
//! The clock is read exactly twice per attempt: on the first call, which
//! captures the start time and arms the countdown, and on the call that
//! finds fewer iterations left than requested, which captures the end time.
//! Every call in between is a compare and a subtract.

use crate::measurement::{black_box, Timer};

/// Lifecycle of a [`Bencher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    /// No call yet; the clock has not been read.
    NotStarted,
    /// Start time captured, counting down.
    Running,
    /// End time captured; further calls return `false`.
    Done,
}

/// Outcome of one timed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// Iterations the attempt was asked to run.
    pub iters_total: u64,
    /// Iterations actually run (may exceed `iters_total` by one step).
    pub iters_complete: u64,
    /// Time between the start and end reads.
    pub elapsed_ns: u64,
}

/// Largest iteration count a single attempt can run.
pub const MAX_ITERS: u64 = i64::MAX as u64;

/// Iteration counter handed to benchmark workloads.
#[derive(Debug)]
pub struct Bencher<'t> {
    iters_remaining: i64,
    state: CounterState,
    start_time_ns: u64,
    timer: &'t Timer,
    iters_total: u64,
    iters_complete: u64,
    elapsed_ns: u64,
}

impl<'t> Bencher<'t> {
    /// Arm a counter for `iters_total` iterations, capped at [`MAX_ITERS`].
    pub fn new(timer: &'t Timer, iters_total: u64) -> Self {
        let iters_total = iters_total.min(MAX_ITERS);
        Self {
            iters_remaining: 0,
            state: CounterState::NotStarted,
            start_time_ns: 0,
            timer,
            iters_total,
            iters_complete: 0,
            elapsed_ns: 0,
        }
    }

    /// Advance by one iteration. Returns `false` once the attempt is over.
    #[inline(always)]
    pub fn next(&mut self) -> bool {
        self.next_n(1)
    }

    /// Advance by `n` iterations at once (`n = 0` is treated as 1).
    #[inline(always)]
    pub fn next_n(&mut self, n: u64) -> bool {
        let n = i64::try_from(n.max(1)).unwrap_or(i64::MAX);
        if self.iters_remaining >= n {
            self.iters_remaining -= n;
            return true;
        }
        self.transition(n)
    }

    #[cold]
    #[inline(never)]
    fn transition(&mut self, n: i64) -> bool {
        match self.state {
            CounterState::NotStarted => {
                debug_assert!(self.timer.is_calibrated(), "timer must be calibrated");
                self.state = CounterState::Running;
                self.iters_remaining = i64::try_from(self.iters_total).unwrap_or(i64::MAX);
                self.start_time_ns = self.timer.now_ns();
                true
            }
            CounterState::Running => {
                let end = self.timer.now_ns();
                self.elapsed_ns = end.saturating_sub(self.start_time_ns);
                // remaining < n, so this cannot go below -i64::MAX
                self.iters_remaining -= n;
                let complete = i128::from(self.iters_total) - i128::from(self.iters_remaining);
                self.iters_complete = u64::try_from(complete).unwrap_or(u64::MAX);
                self.state = CounterState::Done;
                false
            }
            CounterState::Done => false,
        }
    }

    /// Run `f` once per iteration until the attempt is over.
    #[inline]
    pub fn iter<T, F>(&mut self, mut f: F)
    where
        F: FnMut() -> T,
    {
        while self.next() {
            black_box(f());
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CounterState {
        self.state
    }

    /// Iterations requested.
    pub fn iters_total(&self) -> u64 {
        self.iters_total
    }

    /// Iterations left before the stop transition (negative after overshoot).
    pub fn iters_remaining(&self) -> i64 {
        self.iters_remaining
    }

    /// Start read, if the counter has started.
    pub fn start_time_ns(&self) -> Option<u64> {
        match self.state {
            CounterState::NotStarted => None,
            _ => Some(self.start_time_ns),
        }
    }

    /// The finished attempt, or `None` if the stop transition never happened.
    pub fn finish(&self) -> Option<Attempt> {
        match self.state {
            CounterState::Done => Some(Attempt {
                iters_total: self.iters_total,
                iters_complete: self.iters_complete,
                elapsed_ns: self.elapsed_ns,
            }),
            _ => None,
        }
    }
}
