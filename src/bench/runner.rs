//! Adaptive benchmark execution.
//!
//! `run_one` grows the iteration count geometrically until an attempt takes
//! longer than both twice the timer's instrumentation error and an absolute
//! floor. `run_suite` measures the empty loop once, then runs every
//! registered benchmark per round and subtracts the loop overhead, combining
//! errors in quadrature.

use super::counter::Bencher;
use super::registry::{Benchmark, Suite};
use crate::config::Config;
use crate::error::{BenchError, Result};
use crate::measurement::Timer;
use crate::result::{Measurement, SuiteReport};
use crate::statistics::quadrature;

/// Progress reported by [`Runner::run_suite_with`] as measurements land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunEvent<'a> {
    /// The empty-loop baseline was measured.
    Baseline(&'a Measurement),
    /// A benchmark finished, with the baseline already subtracted.
    Measured {
        /// Zero-based round index.
        round: usize,
        /// Corrected measurement.
        measurement: &'a Measurement,
    },
}

/// Runs benchmarks against one calibrated timer.
#[derive(Debug)]
pub struct Runner<'t> {
    timer: &'t Timer,
    config: Config,
}

impl<'t> Runner<'t> {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// [`BenchError::UncalibratedClock`] if `timer` is not calibrated,
    /// [`BenchError::InvalidConfig`] if `config` fails validation.
    pub fn new(timer: &'t Timer, config: Config) -> Result<Self> {
        timer.require_calibrated()?;
        config.validate()?;
        Ok(Self { timer, config })
    }

    /// Configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Timer in use.
    pub fn timer(&self) -> &Timer {
        self.timer
    }

    /// Run one benchmark until its measurement is trustworthy.
    ///
    /// The accepted measurement is also stored on the benchmark.
    ///
    /// # Errors
    ///
    /// - [`BenchError::IncompleteRun`] if the workload returns early
    /// - [`BenchError::DegenerateWorkload`] if the iteration cap is reached
    pub fn run_one(&self, bench: &mut Benchmark) -> Result<Measurement> {
        let instr_err = self.timer.require_calibrated()?.instr_err;
        let required_ns = (2.0 * instr_err).max(self.config.min_elapsed_ns);

        let mut iters = self.config.initial_iterations;
        loop {
            let mut bencher = Bencher::new(self.timer, iters);
            bench.execute(&mut bencher);
            let attempt = bencher.finish().ok_or_else(|| BenchError::IncompleteRun {
                name: bench.name().to_string(),
            })?;

            if attempt.elapsed_ns as f64 > required_ns {
                let measurement = Measurement {
                    name: bench.name().to_string(),
                    iters_total: attempt.iters_total,
                    iters_complete: attempt.iters_complete,
                    elapsed_ns: attempt.elapsed_ns as f64,
                    elapsed_err_ns: 2.0 * instr_err,
                };
                tracing::debug!(
                    bench = bench.name(),
                    iters = attempt.iters_complete,
                    elapsed_ns = attempt.elapsed_ns,
                    "attempt accepted"
                );
                bench.record(measurement.clone());
                return Ok(measurement);
            }

            tracing::trace!(
                bench = bench.name(),
                iters,
                elapsed_ns = attempt.elapsed_ns,
                required_ns,
                "attempt too short"
            );

            let next = iters.saturating_mul(self.config.iteration_growth);
            if next > self.config.max_iterations {
                tracing::warn!(
                    bench = bench.name(),
                    iters,
                    elapsed_ns = attempt.elapsed_ns,
                    "iteration cap reached"
                );
                return Err(BenchError::DegenerateWorkload {
                    name: bench.name().to_string(),
                    iters,
                    elapsed_ns: attempt.elapsed_ns,
                    required_ns,
                });
            }
            iters = next;
        }
    }

    /// Measure `baseline` once, then run every benchmark in `suite` for
    /// `num_rounds` rounds with the baseline's loop cost subtracted.
    ///
    /// Benchmarks run in registration order within each round.
    pub fn run_suite(
        &self,
        suite: &mut Suite,
        baseline: &mut Benchmark,
        num_rounds: usize,
    ) -> Result<SuiteReport> {
        self.run_suite_with(suite, baseline, num_rounds, |_| {})
    }

    /// [`run_suite`](Self::run_suite), calling `on_event` as soon as each
    /// measurement is available.
    ///
    /// If a benchmark fails, every measurement taken before it has already
    /// been reported.
    pub fn run_suite_with<F>(
        &self,
        suite: &mut Suite,
        baseline: &mut Benchmark,
        num_rounds: usize,
        mut on_event: F,
    ) -> Result<SuiteReport>
    where
        F: FnMut(RunEvent<'_>),
    {
        if num_rounds == 0 {
            return Err(BenchError::InvalidConfig {
                message: "num_rounds must be positive".to_string(),
            });
        }
        let timer = self.timer.info().ok_or_else(|| BenchError::UncalibratedClock {
            clock: self.timer.name().to_string(),
        })?;

        let base = self.run_one(baseline)?;
        let loop_cost = base.elapsed_ns / base.iters_complete as f64;
        let loop_cost_err = timer.instr_err_ns / base.iters_complete as f64;
        tracing::debug!(
            loop_cost_per_iter_ns = loop_cost,
            loop_cost_err_per_iter_ns = loop_cost_err,
            "baseline measured"
        );
        on_event(RunEvent::Baseline(&base));

        let mut rounds = Vec::with_capacity(num_rounds);
        for round in 0..num_rounds {
            let mut results = Vec::with_capacity(suite.len());
            for bench in suite.iter_mut() {
                let raw = self.run_one(bench)?;
                let corrected = subtract_baseline(&raw, loop_cost, loop_cost_err);
                bench.record(corrected.clone());
                on_event(RunEvent::Measured {
                    round,
                    measurement: &corrected,
                });
                results.push(corrected);
            }
            rounds.push(results);
        }

        Ok(SuiteReport {
            timer,
            baseline: base,
            loop_cost_per_iter_ns: loop_cost,
            loop_cost_err_per_iter_ns: loop_cost_err,
            rounds,
        })
    }

    /// [`run_suite`](Self::run_suite) with the built-in empty loop and
    /// `config.num_runs` rounds.
    pub fn run(&self, suite: &mut Suite) -> Result<SuiteReport> {
        self.run_with(suite, |_| {})
    }

    /// [`run`](Self::run) with progress events.
    pub fn run_with<F>(&self, suite: &mut Suite, on_event: F) -> Result<SuiteReport>
    where
        F: FnMut(RunEvent<'_>),
    {
        self.run_suite_with(suite, &mut Benchmark::empty_loop(), self.config.num_runs, on_event)
    }
}

/// Remove the empty-loop overhead from a measurement.
///
/// The elapsed time is clamped at zero. The baseline error scales with the
/// iteration count and is combined with the measurement's own error in
/// quadrature, assuming the two are independent.
pub fn subtract_baseline(raw: &Measurement, loop_cost_ns: f64, loop_cost_err_ns: f64) -> Measurement {
    let iters = raw.iters_complete as f64;
    let overhead = loop_cost_ns * iters;
    let elapsed_ns = if raw.elapsed_ns > overhead {
        raw.elapsed_ns - overhead
    } else {
        0.0
    };

    Measurement {
        elapsed_ns,
        elapsed_err_ns: quadrature::combine(raw.elapsed_err_ns, loop_cost_err_ns * iters),
        ..raw.clone()
    }
}
