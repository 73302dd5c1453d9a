//! Clock sources.
//!
//! Provides nanosecond clocks for the calibrator and benchmark runner:
//! - `MonotonicClock`: `std::time::Instant`, anchored at construction
//! - `CycleClock`: `lfence; rdtsc` on x86_64, `isb; mrs cntvct_el0` on aarch64,
//!   converted to nanoseconds with a measured ratio
//! - `SimulatedClock`: manually advanced virtual time for deterministic runs

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonically non-decreasing nanosecond clock.
pub trait ClockSource {
    /// Name used in reports and errors.
    fn name(&self) -> &str;

    /// Read the clock.
    fn now_ns(&self) -> u64;

    /// Smallest time step the clock can resolve, in nanoseconds (at least 1).
    fn precision_ns(&self) -> u64;
}

/// Process-local monotonic clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor: Instant,
    precision_ns: u64,
}

impl MonotonicClock {
    /// Create a clock.
    ///
    /// The resolution is the one the OS reports for `CLOCK_MONOTONIC`. Where
    /// that is unavailable it is estimated from back-to-back reads, which
    /// overstates it by up to one read's cost.
    pub fn new() -> Self {
        let anchor = Instant::now();
        let precision_ns = monotonic_resolution_ns()
            .unwrap_or_else(|| min_nonzero_step(|| anchor.elapsed().as_nanos() as u64));
        Self {
            anchor,
            precision_ns,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn name(&self) -> &str {
        "monotonic"
    }

    #[inline]
    fn now_ns(&self) -> u64 {
        self.anchor.elapsed().as_nanos() as u64
    }

    fn precision_ns(&self) -> u64 {
        self.precision_ns
    }
}

/// `clock_getres(CLOCK_MONOTONIC)` in nanoseconds, at least 1.
#[cfg(unix)]
fn monotonic_resolution_ns() -> Option<u64> {
    // SAFETY: an all-zero timespec is a valid value.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: `ts` is a valid out-pointer for the duration of the call.
    let rc = unsafe { libc::clock_getres(libc::CLOCK_MONOTONIC, &mut ts) };
    if rc != 0 {
        tracing::debug!("clock_getres failed, estimating resolution");
        return None;
    }
    let secs = u64::try_from(ts.tv_sec).ok()?;
    let nanos = u64::try_from(ts.tv_nsec).ok()?;
    Some(secs.saturating_mul(1_000_000_000).saturating_add(nanos).max(1))
}

#[cfg(not(unix))]
fn monotonic_resolution_ns() -> Option<u64> {
    None
}

/// Smallest non-zero difference between back-to-back reads (1 if none seen).
fn min_nonzero_step(read: impl Fn() -> u64) -> u64 {
    let mut min_diff = u64::MAX;
    for _ in 0..1000 {
        let t1 = read();
        let t2 = read();
        let diff = t2.saturating_sub(t1);
        if diff > 0 && diff < min_diff {
            min_diff = diff;
        }
    }
    if min_diff == u64::MAX {
        1
    } else {
        min_diff
    }
}

/// Read the CPU cycle counter with serialization.
///
/// On other architectures this falls back to nanoseconds since first use.
#[inline]
pub fn read_cycles() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        read_cycles_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        read_cycles_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        use std::sync::OnceLock;
        static START: OnceLock<Instant> = OnceLock::new();
        START.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn read_cycles_x86_64() -> u64 {
    use std::sync::atomic::{compiler_fence, Ordering};

    compiler_fence(Ordering::SeqCst);
    let cycles: u64;
    // SAFETY: lfence and rdtsc have no memory operands and are available on every x86_64 CPU.
    unsafe {
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }
    compiler_fence(Ordering::SeqCst);
    cycles
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn read_cycles_aarch64() -> u64 {
    use std::sync::atomic::{compiler_fence, Ordering};

    compiler_fence(Ordering::SeqCst);
    let cycles: u64;
    // SAFETY: cntvct_el0 is readable from EL0 on every supported OS.
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }
    compiler_fence(Ordering::SeqCst);
    cycles
}

/// Measure how many counter ticks elapse per nanosecond.
///
/// Takes the median ratio over `rounds` short sleeps. Returns 1.0 if no
/// round produced a usable ratio.
pub fn cycles_per_ns(rounds: usize) -> f64 {
    let mut ratios = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let start_cycles = read_cycles();
        let start_time = Instant::now();
        std::thread::sleep(Duration::from_millis(1));
        let end_cycles = read_cycles();
        let elapsed = start_time.elapsed().as_nanos() as u64;

        if elapsed == 0 {
            continue;
        }
        ratios.push(end_cycles.saturating_sub(start_cycles) as f64 / elapsed as f64);
    }

    if ratios.is_empty() {
        return 1.0;
    }

    ratios.sort_by(|a, b| a.total_cmp(b));
    let mid = ratios.len() / 2;
    if ratios.len() % 2 == 0 {
        (ratios[mid - 1] + ratios[mid]) / 2.0
    } else {
        ratios[mid]
    }
}

/// Hardware cycle counter clock.
#[derive(Debug, Clone)]
pub struct CycleClock {
    anchor: u64,
    cycles_per_ns: f64,
    precision_ns: u64,
}

impl CycleClock {
    /// Create a clock, measuring the tick rate over ten 1 ms sleeps.
    pub fn new() -> Self {
        Self::with_cycles_per_ns(cycles_per_ns(10))
    }

    /// Create a clock with a known tick rate.
    pub fn with_cycles_per_ns(cycles_per_ns: f64) -> Self {
        let cycles_per_ns = if cycles_per_ns > 0.0 { cycles_per_ns } else { 1.0 };
        Self {
            anchor: read_cycles(),
            cycles_per_ns,
            // One tick, rounded up to whole nanoseconds
            precision_ns: ((1.0 / cycles_per_ns).ceil() as u64).max(1),
        }
    }

    /// Counter ticks per nanosecond.
    pub fn cycles_per_ns(&self) -> f64 {
        self.cycles_per_ns
    }
}

impl Default for CycleClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for CycleClock {
    fn name(&self) -> &str {
        #[cfg(target_arch = "x86_64")]
        {
            "rdtsc"
        }
        #[cfg(target_arch = "aarch64")]
        {
            "cntvct_el0"
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            "instant"
        }
    }

    #[inline]
    fn now_ns(&self) -> u64 {
        let ticks = read_cycles().saturating_sub(self.anchor);
        (ticks as f64 / self.cycles_per_ns) as u64
    }

    fn precision_ns(&self) -> u64 {
        self.precision_ns
    }
}

#[derive(Debug)]
struct SimulatedState {
    now: Cell<u64>,
    step: Cell<u64>,
    reads: Cell<u64>,
}

/// Deterministic virtual clock.
///
/// Each read returns the current virtual time and then advances it by the
/// configured step. Workloads advance time explicitly with
/// [`advance`](Self::advance). Clones share the same timeline, so a test can
/// keep a handle while a [`Timer`](super::Timer) owns another.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    state: Rc<SimulatedState>,
    precision_ns: u64,
}

impl SimulatedClock {
    /// Start at `start_ns`, advancing `step_ns` per read.
    pub fn new(start_ns: u64, step_ns: u64) -> Self {
        Self {
            state: Rc::new(SimulatedState {
                now: Cell::new(start_ns),
                step: Cell::new(step_ns),
                reads: Cell::new(0),
            }),
            precision_ns: 1,
        }
    }

    /// Override the reported resolution.
    pub fn with_precision(mut self, precision_ns: u64) -> Self {
        self.precision_ns = precision_ns.max(1);
        self
    }

    /// Move virtual time forward.
    pub fn advance(&self, ns: u64) {
        self.state.now.set(self.state.now.get() + ns);
    }

    /// Change how far each read advances time.
    pub fn set_step(&self, step_ns: u64) {
        self.state.step.set(step_ns);
    }

    /// Current virtual time, without counting as a read.
    pub fn peek(&self) -> u64 {
        self.state.now.get()
    }

    /// Number of reads so far.
    pub fn reads(&self) -> u64 {
        self.state.reads.get()
    }
}

impl ClockSource for SimulatedClock {
    fn name(&self) -> &str {
        "simulated"
    }

    fn now_ns(&self) -> u64 {
        let now = self.state.now.get();
        self.state.now.set(now + self.state.step.get());
        self.state.reads.set(self.state.reads.get() + 1);
        now
    }

    fn precision_ns(&self) -> u64 {
        self.precision_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_non_decreasing() {
        let clock = MonotonicClock::new();
        let mut last = clock.now_ns();
        for _ in 0..10_000 {
            let now = clock.now_ns();
            assert!(now >= last);
            last = now;
        }
        assert!(clock.precision_ns() >= 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_monotonic_precision_is_os_resolution() {
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::clock_getres(libc::CLOCK_MONOTONIC, &mut ts) };
        assert_eq!(rc, 0);
        let expected = (ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64).max(1);

        // Not the cost of a read, which is what back-to-back sampling measures
        let clock = MonotonicClock::new();
        assert_eq!(clock.precision_ns(), expected);
    }

    #[test]
    fn test_min_nonzero_step_measures_read_gap() {
        let clock = SimulatedClock::new(0, 35);
        assert_eq!(min_nonzero_step(|| clock.now_ns()), 35);
        let frozen = SimulatedClock::new(0, 0);
        assert_eq!(min_nonzero_step(|| frozen.now_ns()), 1);
    }

    #[test]
    fn test_cycle_clock_tracks_wall_time() {
        let clock = CycleClock::new();
        let start = clock.now_ns();
        std::thread::sleep(Duration::from_millis(5));
        let elapsed = clock.now_ns() - start;
        // Generous bounds: sleep may overshoot, and the ratio is an estimate
        assert!(elapsed > 2_000_000, "elapsed = {}", elapsed);
        assert!(elapsed < 500_000_000, "elapsed = {}", elapsed);
    }

    #[test]
    fn test_cycle_clock_precision_rounds_up() {
        let clock = CycleClock::with_cycles_per_ns(0.024);
        assert_eq!(clock.precision_ns(), 42);
        let fast = CycleClock::with_cycles_per_ns(3.0);
        assert_eq!(fast.precision_ns(), 1);
    }

    #[test]
    fn test_simulated_clock_steps() {
        let clock = SimulatedClock::new(1_000, 100);
        assert_eq!(clock.now_ns(), 1_000);
        assert_eq!(clock.now_ns(), 1_100);
        clock.advance(50);
        assert_eq!(clock.now_ns(), 1_250);
        assert_eq!(clock.reads(), 3);
    }

    #[test]
    fn test_simulated_clock_clones_share_time() {
        let clock = SimulatedClock::new(0, 0);
        let handle = clock.clone();
        handle.advance(500);
        assert_eq!(clock.now_ns(), 500);
        assert_eq!(handle.reads(), 1);
    }
}
