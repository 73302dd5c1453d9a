//! # calibench
//!
//! Microbenchmarking with calibrated timers.
//!
//! This crate measures the wall-clock cost of a unit of work and reports it
//! with an error bound:
//! - Clocks are calibrated once: read cost, resolution and jitter combine
//!   into an instrumentation error
//! - Each benchmark grows its iteration count until the elapsed time clears
//!   both twice that error and 1 ms
//! - An empty-loop baseline is subtracted, with errors added in quadrature
//!
//! ## Quick Start
//!
//! ```ignore
//! use calibench::{black_box, Suite};
//!
//! let mut suite = Suite::new();
//! suite.bench("sum-1k", |b| {
//!     while b.next() {
//!         black_box((0..1000u64).sum::<u64>());
//!     }
//! });
//!
//! let report = calibench::run(&mut suite)?;
//! for m in report.measurements() {
//!     println!("{}: {:.2} ns/iter", m.name, m.per_iter_ns());
//! }
//! ```
//!
//! ## Workload Contract
//!
//! A workload must call [`Bencher::next`] (or [`Bencher::next_n`]) once per
//! unit of work until it returns `false`. The clock is read only on the first
//! and the last call, so the loop itself costs a compare and a subtract per
//! iteration; that residual cost is what the empty-loop baseline removes.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod result;

// Functional modules
pub mod bench;
pub mod measurement;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use bench::{Attempt, BenchId, Bencher, Benchmark, CounterState, RunEvent, Runner, Suite};
pub use config::Config;
pub use error::{BenchError, Result};
pub use measurement::{black_box, Calibration, CalibrationConfig, ClockSource, Timer};
pub use result::{Measurement, SuiteReport, TimerInfo};

/// Run a suite with default settings and print each result to stderr as
/// soon as it is measured.
///
/// Configuration comes from [`Config::from_env`]; the clock is the process
/// monotonic clock, calibrated with the configured trimming policy.
///
/// # Errors
///
/// Fails if the clock cannot be calibrated or any benchmark fails.
pub fn run(suite: &mut Suite) -> Result<SuiteReport> {
    let config = Config::from_env();
    let mut timer = Timer::new(measurement::MonotonicClock::new());
    timer.calibrate_with(&config.calibration_config())?;

    let runner = Runner::new(&timer, config)?;
    let config = runner.config();
    if let Some(info) = timer.info() {
        output::print_preamble(&info, config);
    }
    runner.run_with(suite, |event| output::print_event(&event, config))
}
