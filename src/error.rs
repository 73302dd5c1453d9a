//! Error types for calibration and benchmark execution.

/// Errors produced while calibrating clocks or running benchmarks.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// The clock never produced a stable distribution within the batch budget.
    ///
    /// Fatal for every benchmark that uses this clock.
    #[error("calibration of clock `{clock}` did not converge below batch size {max_batch}")]
    CalibrationFailure {
        /// Name of the clock source.
        clock: String,
        /// Batch size at which calibration gave up.
        max_batch: usize,
    },

    /// A benchmark was started against a timer that has not been calibrated.
    #[error("clock `{clock}` is not calibrated")]
    UncalibratedClock {
        /// Name of the clock source.
        clock: String,
    },

    /// Iteration escalation hit the configured cap without a trustworthy measurement.
    #[error(
        "benchmark `{name}` still took only {elapsed_ns} ns after {iters} iterations (needs > {required_ns:.0} ns)"
    )]
    DegenerateWorkload {
        /// Benchmark name.
        name: String,
        /// Iterations requested by the last attempt.
        iters: u64,
        /// Elapsed time of the last attempt.
        elapsed_ns: u64,
        /// Threshold the attempt had to clear.
        required_ns: f64,
    },

    /// The workload returned before the iteration counter signalled stop.
    #[error("benchmark `{name}` returned before its iteration counter finished")]
    IncompleteRun {
        /// Benchmark name.
        name: String,
    },

    /// Standard deviation needs at least two samples.
    #[error("insufficient samples: need at least {needed}, got {actual}")]
    InsufficientSamples {
        /// Minimum sample count.
        needed: usize,
        /// Samples provided.
        actual: usize,
    },

    /// Rejected configuration value.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BenchError>;
