//! Configuration for benchmark runs.

use std::env;

use crate::bench::MAX_ITERS;
use crate::error::{BenchError, Result};
use crate::measurement::CalibrationConfig;
use crate::statistics::TrimPolicy;

/// Configuration options for [`Runner`](crate::Runner).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Rounds over the whole suite (default: 1).
    pub num_runs: usize,

    /// Print the calibrated timer table before results (default: false).
    pub print_timers: bool,

    /// Print the raw empty-loop baseline with the results (default: false).
    pub print_empty_loop_baseline: bool,

    /// Iterations of the first attempt (default: 100).
    pub initial_iterations: u64,

    /// Factor applied to the iteration count after a rejected attempt (default: 10).
    pub iteration_growth: u64,

    /// Absolute floor an accepted attempt must exceed, in nanoseconds (default: 1 ms).
    pub min_elapsed_ns: f64,

    /// Iteration count beyond which a workload is declared degenerate
    /// (default: 10^10).
    pub max_iterations: u64,

    /// Outlier trimming policy used when calibrating (default: asymmetric).
    pub trim_policy: TrimPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_runs: 1,
            print_timers: false,
            print_empty_loop_baseline: false,
            initial_iterations: 100,
            iteration_growth: 10,
            min_elapsed_ns: 1e6,
            max_iterations: 10_000_000_000,
            trim_policy: TrimPolicy::Asymmetric,
        }
    }
}

impl Config {
    /// Default configuration overlaid with environment variables.
    ///
    /// Recognized variables (invalid values are ignored):
    /// - `CALIBENCH_RUNS`: number of rounds
    /// - `CALIBENCH_PRINT_TIMERS`: `1`/`true` to print the timer table
    /// - `CALIBENCH_PRINT_EMPTY`: `1`/`true` to print the empty-loop baseline
    /// - `CALIBENCH_MAX_ITERS`: iteration cap
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Overlay environment variables onto `self`.
    pub fn merge_env(mut self) -> Self {
        if let Some(runs) = parse_usize_env("CALIBENCH_RUNS") {
            self.num_runs = runs;
        }
        if let Some(flag) = parse_bool_env("CALIBENCH_PRINT_TIMERS") {
            self.print_timers = flag;
        }
        if let Some(flag) = parse_bool_env("CALIBENCH_PRINT_EMPTY") {
            self.print_empty_loop_baseline = flag;
        }
        if let Some(max) = parse_u64_env("CALIBENCH_MAX_ITERS") {
            self.max_iterations = max;
        }
        self
    }

    /// Set the number of rounds.
    pub fn num_runs(mut self, n: usize) -> Self {
        self.num_runs = n;
        self
    }

    /// Toggle the timer table.
    pub fn print_timers(mut self, yes: bool) -> Self {
        self.print_timers = yes;
        self
    }

    /// Toggle printing of the empty-loop baseline.
    pub fn print_empty_loop_baseline(mut self, yes: bool) -> Self {
        self.print_empty_loop_baseline = yes;
        self
    }

    /// Set the iteration cap.
    pub fn max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    /// Set the absolute elapsed-time floor.
    pub fn min_elapsed_ns(mut self, ns: f64) -> Self {
        self.min_elapsed_ns = ns;
        self
    }

    /// Set the trimming policy.
    pub fn trim_policy(mut self, policy: TrimPolicy) -> Self {
        self.trim_policy = policy;
        self
    }

    /// Calibration settings carrying this configuration's trimming policy.
    pub fn calibration_config(&self) -> CalibrationConfig {
        let mut calibration = CalibrationConfig::default();
        calibration.normality.policy = self.trim_policy;
        calibration
    }

    /// Reject values the runner cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(BenchError::InvalidConfig { message });

        if self.num_runs == 0 {
            return invalid("num_runs must be positive".to_string());
        }
        if self.initial_iterations == 0 {
            return invalid("initial_iterations must be positive".to_string());
        }
        if self.iteration_growth < 2 {
            return invalid(format!(
                "iteration_growth must be at least 2, got {}",
                self.iteration_growth
            ));
        }
        if self.max_iterations < self.initial_iterations {
            return invalid(format!(
                "max_iterations ({}) is below initial_iterations ({})",
                self.max_iterations, self.initial_iterations
            ));
        }
        if self.max_iterations > MAX_ITERS {
            return invalid(format!(
                "max_iterations ({}) exceeds the per-attempt limit ({})",
                self.max_iterations, MAX_ITERS
            ));
        }
        if self.min_elapsed_ns.is_nan() || self.min_elapsed_ns < 0.0 {
            return invalid(format!("min_elapsed_ns must be non-negative, got {}", self.min_elapsed_ns));
        }
        Ok(())
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    env::var(key).ok()?.parse().ok()
}

fn parse_u64_env(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
