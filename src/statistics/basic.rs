//! Mean, median and standard deviation over a sample buffer.

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Summary statistics of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (average of the two middle elements for even counts).
    pub median: f64,
    /// Sample standard deviation (Bessel-corrected, divides by N-1).
    pub stddev: f64,
}

/// Compute mean, median and standard deviation of `samples`.
///
/// The slice is sorted in place as a side effect; callers that need the
/// original order must copy first.
///
/// Mean and standard deviation come from the running sum and sum of squares.
/// The variance is clamped at zero so that cancellation on identical values
/// never produces a NaN.
///
/// # Errors
///
/// Returns [`BenchError::InsufficientSamples`] for fewer than two samples,
/// where the N-1 correction is undefined.
pub fn basic_stats(samples: &mut [f64]) -> Result<BasicStats> {
    let n = samples.len();
    if n < 2 {
        return Err(BenchError::InsufficientSamples {
            needed: 2,
            actual: n,
        });
    }

    samples.sort_unstable_by(|a, b| a.total_cmp(b));

    let (sum, sum2) = samples
        .iter()
        .fold((0.0_f64, 0.0_f64), |(s, s2), &x| (s + x, s2 + x * x));

    let len = n as f64;
    let mean = sum / len;
    let variance = ((sum2 - sum * sum / len) / (len - 1.0)).max(0.0);

    let middle = n / 2;
    let median = if n % 2 == 1 {
        samples[middle]
    } else {
        (samples[middle - 1] + samples[middle]) / 2.0
    };

    Ok(BasicStats {
        mean,
        median,
        stddev: variance.sqrt(),
    })
}
