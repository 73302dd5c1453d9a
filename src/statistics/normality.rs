//! Outlier trimming and the mean-versus-median normality quicktest.
//!
//! A sample is classified by:
//! 1. Computing mean, median and standard deviation over the whole sample
//!    (which sorts it).
//! 2. Flagging every value further than `outlier_sigmas` standard deviations
//!    from the mean and shrinking the effective range around them.
//! 3. Giving up with [`Distribution::TooManyOutliers`] when more than
//!    `max_outlier_fraction` of the sample was flagged.
//! 4. Recomputing the statistics over the surviving range and calling the
//!    distribution normal when mean and median agree to within `closeness`
//!    (relative to the larger of the two).

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::basic::{basic_stats, BasicStats};
use crate::error::Result;

/// Classification of a sample distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distribution {
    /// Mean and median agree after trimming.
    Normal,
    /// Trimmed sample is skewed.
    NotNormal,
    /// Too large a share of the sample was flagged as outliers.
    TooManyOutliers,
}

/// How flagged outliers shrink the effective range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrimPolicy {
    /// Scan forward once: outliers before the first in-range value move the
    /// start forward, outliers after it pull the end back. The scan bound
    /// shrinks with the end, so a long tail of outliers is only partly
    /// counted and partly trimmed.
    #[default]
    Asymmetric,
    /// Count and drop every flagged value at either end of the sorted sample.
    All,
}

/// Thresholds for [`detect_normal_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    /// Deviation from the mean, in standard deviations, beyond which a value
    /// is an outlier (default: 3.0).
    pub outlier_sigmas: f64,
    /// Largest tolerated outlier share of the original sample (default: 0.25).
    pub max_outlier_fraction: f64,
    /// Maximum `|mean - median| / max(mean, median)` for a normal verdict
    /// (default: 0.005).
    pub closeness: f64,
    /// Trimming policy (default: [`TrimPolicy::Asymmetric`]).
    pub policy: TrimPolicy,
}

impl Default for NormalityTest {
    fn default() -> Self {
        Self {
            outlier_sigmas: 3.0,
            max_outlier_fraction: 0.25,
            closeness: 0.005,
            policy: TrimPolicy::Asymmetric,
        }
    }
}

/// Outcome of [`detect_normal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityReport {
    /// Distribution class.
    pub distribution: Distribution,
    /// Surviving range of the (now sorted) sample.
    pub range: Range<usize>,
    /// Number of values counted as outliers.
    pub outliers: usize,
    /// Statistics over `range`, or over the whole sample when there were too
    /// many outliers to trim.
    pub stats: BasicStats,
}

impl NormalityReport {
    /// Whether the distribution was classified normal.
    pub fn is_normal(&self) -> bool {
        self.distribution == Distribution::Normal
    }
}

/// Mean-versus-median quicktest.
///
/// Returns `false` when both are zero, since the relative distance is undefined.
pub fn normal_quicktest(mean: f64, median: f64, closeness: f64) -> bool {
    let scale = mean.max(median);
    (mean - median).abs() / scale < closeness
}

/// Classify `samples` with the default thresholds.
///
/// `samples` is sorted in place; the returned range indexes the sorted slice.
pub fn detect_normal(samples: &mut [f64]) -> Result<NormalityReport> {
    detect_normal_with(samples, &NormalityTest::default())
}

/// Classify `samples` with explicit thresholds.
///
/// # Errors
///
/// Returns [`crate::BenchError::InsufficientSamples`] if the sample (or the
/// trimmed range) holds fewer than two values.
pub fn detect_normal_with(samples: &mut [f64], test: &NormalityTest) -> Result<NormalityReport> {
    let full = basic_stats(samples)?;
    let limit = test.outlier_sigmas * full.stddev;
    let is_outlier = |x: f64| (x - full.mean).abs() > limit;

    let (range, outliers) = match test.policy {
        TrimPolicy::Asymmetric => trim_asymmetric(samples, is_outlier),
        TrimPolicy::All => trim_all(samples, is_outlier),
    };

    if outliers as f64 / samples.len() as f64 > test.max_outlier_fraction {
        return Ok(NormalityReport {
            distribution: Distribution::TooManyOutliers,
            range,
            outliers,
            stats: full,
        });
    }

    let stats = basic_stats(&mut samples[range.clone()])?;
    let distribution = if normal_quicktest(stats.mean, stats.median, test.closeness) {
        Distribution::Normal
    } else {
        Distribution::NotNormal
    };

    Ok(NormalityReport {
        distribution,
        range,
        outliers,
        stats,
    })
}

fn trim_asymmetric(samples: &[f64], is_outlier: impl Fn(f64) -> bool) -> (Range<usize>, usize) {
    let mut start = 0;
    let mut end = samples.len();
    let mut outliers = 0;
    let mut found_ok = false;

    let mut i = 0;
    while i < end {
        if is_outlier(samples[i]) {
            if found_ok {
                end -= 1;
            } else {
                start += 1;
            }
            outliers += 1;
        } else {
            found_ok = true;
        }
        i += 1;
    }

    (start..end, outliers)
}

fn trim_all(samples: &[f64], is_outlier: impl Fn(f64) -> bool) -> (Range<usize>, usize) {
    let leading = samples.iter().take_while(|&&x| is_outlier(x)).count();
    let trailing = samples[leading..]
        .iter()
        .rev()
        .take_while(|&&x| is_outlier(x))
        .count();

    (leading..samples.len() - trailing, leading + trailing)
}
