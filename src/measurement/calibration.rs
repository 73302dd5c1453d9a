//! Clock calibration.
//!
//! Characterizes a clock by reading it back-to-back and classifying the
//! distribution of successive differences:
//! 1. Warm the clock up with discarded reads.
//! 2. For growing batch sizes, take `batch * ring_size` reads into a ring of
//!    `ring_size` slots and difference the adjacent slots.
//! 3. Accept the batch when the differences look normal, or when they are
//!    quantized (integer ticks) with mean and median within one tick.
//! 4. Fail once the batch size reaches `max_batch`.
//!
//! From the accepted statistics, the per-read cost is the one-sided 97.5%
//! bound `mean + 1.96 * stddev` and the instrumentation error is
//! `2 * (precision + 1.96 * stddev + cost / 2)`.

use serde::{Deserialize, Serialize};

use super::clock::ClockSource;
use crate::error::{BenchError, Result};
use crate::statistics::{detect_normal_with, BasicStats, Distribution, NormalityTest};

/// z-score of the one-sided 97.5% bound.
const Z_975: f64 = 1.96;

/// Settings for [`calibrate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Discarded reads before sampling (default: 100).
    pub warmup_reads: usize,
    /// Slots in the sampling ring (default: 1024).
    pub ring_size: usize,
    /// Batch size of the first attempt and increment between attempts (default: 100).
    pub batch_step: usize,
    /// Batch size at which calibration gives up (default: 1000).
    pub max_batch: usize,
    /// Outlier and normality thresholds.
    pub normality: NormalityTest,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            warmup_reads: 100,
            ring_size: 1024,
            batch_step: 100,
            max_batch: 1000,
            normality: NormalityTest::default(),
        }
    }
}

impl CalibrationConfig {
    fn validate(&self) -> Result<()> {
        if self.ring_size < 3 {
            return Err(BenchError::InvalidConfig {
                message: format!("ring_size must be at least 3, got {}", self.ring_size),
            });
        }
        if self.batch_step == 0 {
            return Err(BenchError::InvalidConfig {
                message: "batch_step must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Calibration state of a clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Clock resolution in nanoseconds.
    pub precision_ns: u64,
    /// Upper bound on the cost of one clock read, in nanoseconds.
    pub get_cost_ns: f64,
    /// Combined instrumentation error bound, in nanoseconds.
    pub instr_err: f64,
    /// Batch size of the accepted attempt.
    pub batch_size: usize,
    /// Classification of the accepted attempt.
    pub distribution: Distribution,
    /// Outliers trimmed in the accepted attempt.
    pub outliers: usize,
    /// Read-to-read statistics after trimming.
    pub stats: BasicStats,
}

impl Calibration {
    /// Derive cost and error bounds from accepted read-to-read statistics.
    pub fn from_stats(precision_ns: u64, stats: BasicStats) -> Self {
        let get_cost_ns = stats.mean + Z_975 * stats.stddev;
        let instr_err = 2.0 * (precision_ns as f64 + Z_975 * stats.stddev + get_cost_ns / 2.0);
        Self {
            precision_ns,
            get_cost_ns,
            instr_err,
            batch_size: 0,
            distribution: Distribution::Normal,
            outliers: 0,
            stats,
        }
    }
}

/// Calibrate `clock`.
///
/// # Errors
///
/// [`BenchError::CalibrationFailure`] if no batch below `max_batch` produced
/// an acceptable distribution; [`BenchError::InvalidConfig`] for a ring too
/// small to difference.
pub fn calibrate(clock: &dyn ClockSource, config: &CalibrationConfig) -> Result<Calibration> {
    config.validate()?;

    let precision_ns = clock.precision_ns();
    let ring_size = config.ring_size;

    for _ in 0..config.warmup_reads {
        clock.now_ns();
    }

    let mut ring = vec![0u64; ring_size];
    let mut deltas = Vec::with_capacity(ring_size - 1);

    let mut batch = config.batch_step;
    while batch < config.max_batch {
        for i in 0..ring_size * batch {
            ring[i % ring_size] = clock.now_ns();
        }

        deltas.clear();
        deltas.extend(ring.windows(2).map(|w| w[1] as f64 - w[0] as f64));

        let report = detect_normal_with(&mut deltas, &config.normality)?;
        let stats = report.stats;
        let quantized = report.distribution != Distribution::TooManyOutliers
            && (stats.mean - stats.median).abs() < precision_ns as f64;

        tracing::debug!(
            clock = clock.name(),
            batch,
            distribution = ?report.distribution,
            outliers = report.outliers,
            mean = stats.mean,
            median = stats.median,
            stddev = stats.stddev,
            "calibration attempt"
        );

        if report.is_normal() || quantized {
            let calibration = Calibration {
                batch_size: batch,
                distribution: report.distribution,
                outliers: report.outliers,
                ..Calibration::from_stats(precision_ns, stats)
            };
            tracing::info!(
                clock = clock.name(),
                precision_ns,
                get_cost_ns = calibration.get_cost_ns,
                instr_err = calibration.instr_err,
                "clock calibrated"
            );
            return Ok(calibration);
        }

        batch += config.batch_step;
    }

    tracing::warn!(
        clock = clock.name(),
        max_batch = config.max_batch,
        "clock calibration did not converge"
    );
    Err(BenchError::CalibrationFailure {
        clock: clock.name().to_string(),
        max_batch: config.max_batch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::SimulatedClock;
    use std::cell::Cell;

    /// Alternates between a short and a long step per read.
    struct BimodalClock {
        now: Cell<u64>,
        reads: Cell<u64>,
    }

    impl ClockSource for BimodalClock {
        fn name(&self) -> &str {
            "bimodal"
        }

        fn now_ns(&self) -> u64 {
            let reads = self.reads.get();
            self.reads.set(reads + 1);
            let step = if reads % 2 == 0 { 10 } else { 1_000 };
            let now = self.now.get();
            self.now.set(now + step);
            now
        }

        fn precision_ns(&self) -> u64 {
            1
        }
    }

    #[test]
    fn test_constant_step_clock() {
        let clock = SimulatedClock::new(5_000, 100);
        let calibration = calibrate(&clock, &CalibrationConfig::default()).unwrap();
        assert_eq!(calibration.batch_size, 100);
        assert_eq!(calibration.distribution, Distribution::Normal);
        assert_eq!(calibration.stats.mean, 100.0);
        assert_eq!(calibration.stats.stddev, 0.0);
        assert_eq!(calibration.get_cost_ns, 100.0);
        // 2 * (1 + 0 + 50)
        assert_eq!(calibration.instr_err, 102.0);
        // Warmup plus one batch of 100 * 1024 reads
        assert_eq!(clock.reads(), 100 + 100 * 1024);
    }

    #[test]
    fn test_error_formula() {
        let stats = BasicStats {
            mean: 20.0,
            median: 20.0,
            stddev: 5.0,
        };
        let calibration = Calibration::from_stats(10, stats);
        assert!((calibration.get_cost_ns - 29.8).abs() < 1e-9);
        // 2 * (10 + 9.8 + 14.9)
        assert!((calibration.instr_err - 69.4).abs() < 1e-9);
    }

    #[test]
    fn test_bimodal_clock_fails_after_budget() {
        let clock = BimodalClock {
            now: Cell::new(0),
            reads: Cell::new(0),
        };
        let config = CalibrationConfig {
            max_batch: 300,
            ..CalibrationConfig::default()
        };
        match calibrate(&clock, &config) {
            Err(BenchError::CalibrationFailure { clock: name, max_batch }) => {
                assert_eq!(name, "bimodal");
                assert_eq!(max_batch, 300);
            }
            other => panic!("expected CalibrationFailure, got {:?}", other),
        }
        // Batches 100 and 200 were attempted
        assert_eq!(clock.reads.get(), 100 + (100 + 200) * 1024);
    }

    /// Coarse clock: three reads in four see no tick, the fourth sees one
    /// 40ns tick. Differences are skewed (mean 10, median 0) but not outliers.
    struct Coarse {
        reads: Cell<u64>,
        precision_ns: u64,
    }

    impl Coarse {
        fn new(precision_ns: u64) -> Self {
            Self {
                reads: Cell::new(0),
                precision_ns,
            }
        }
    }

    impl ClockSource for Coarse {
        fn name(&self) -> &str {
            "coarse"
        }

        fn now_ns(&self) -> u64 {
            let r = self.reads.get();
            self.reads.set(r + 1);
            (r / 4) * 40
        }

        fn precision_ns(&self) -> u64 {
            self.precision_ns
        }
    }

    #[test]
    fn test_quantized_clock_accepted() {
        let clock = Coarse::new(40);
        let calibration = calibrate(&clock, &CalibrationConfig::default()).unwrap();
        assert_eq!(calibration.precision_ns, 40);
        assert_eq!(calibration.batch_size, 100);
        assert_eq!(calibration.distribution, Distribution::NotNormal);
        assert!((calibration.stats.mean - calibration.stats.median).abs() < 40.0);
    }

    #[test]
    fn test_skewed_clock_rejected_when_gap_exceeds_resolution() {
        // Same readings, but a 5ns resolution cannot explain a ~10ns gap
        let clock = Coarse::new(5);
        let config = CalibrationConfig {
            max_batch: 300,
            ..CalibrationConfig::default()
        };
        assert!(matches!(
            calibrate(&clock, &config),
            Err(BenchError::CalibrationFailure { .. })
        ));
        assert_eq!(clock.reads.get(), 100 + (100 + 200) * 1024);
    }

    #[test]
    fn test_tiny_ring_rejected() {
        let clock = SimulatedClock::new(0, 1);
        let config = CalibrationConfig {
            ring_size: 2,
            ..CalibrationConfig::default()
        };
        assert!(matches!(
            calibrate(&clock, &config),
            Err(BenchError::InvalidConfig { .. })
        ));
    }
}
