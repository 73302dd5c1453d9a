//! Benchmark results handed to the reporting layer.

use serde::{Deserialize, Serialize};

/// Result of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Benchmark name.
    pub name: String,
    /// Iterations requested by the accepted attempt.
    pub iters_total: u64,
    /// Iterations actually executed.
    pub iters_complete: u64,
    /// Elapsed time in nanoseconds (after baseline subtraction, when applied).
    pub elapsed_ns: f64,
    /// Error bound on `elapsed_ns`, in nanoseconds.
    pub elapsed_err_ns: f64,
}

impl Measurement {
    /// Mean cost of one iteration in nanoseconds.
    pub fn per_iter_ns(&self) -> f64 {
        if self.iters_complete == 0 {
            0.0
        } else {
            self.elapsed_ns / self.iters_complete as f64
        }
    }

    /// Error bound on [`per_iter_ns`](Self::per_iter_ns).
    pub fn per_iter_err_ns(&self) -> f64 {
        if self.iters_complete == 0 {
            0.0
        } else {
            self.elapsed_err_ns / self.iters_complete as f64
        }
    }
}

/// Calibrated timer summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerInfo {
    /// Clock name.
    pub name: String,
    /// Clock resolution.
    pub precision_ns: u64,
    /// Upper bound on the cost of one read.
    pub get_cost_ns: f64,
    /// Instrumentation error bound.
    pub instr_err_ns: f64,
}

/// Everything a suite run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Timer used for every measurement.
    pub timer: TimerInfo,
    /// Raw empty-loop measurement.
    pub baseline: Measurement,
    /// Empty-loop cost per iteration.
    pub loop_cost_per_iter_ns: f64,
    /// Error on the empty-loop cost per iteration.
    pub loop_cost_err_per_iter_ns: f64,
    /// Baseline-corrected measurements, one inner vector per round in
    /// registration order.
    pub rounds: Vec<Vec<Measurement>>,
}

impl SuiteReport {
    /// All measurements in execution order.
    pub fn measurements(&self) -> impl Iterator<Item = &Measurement> {
        self.rounds.iter().flatten()
    }

    /// Measurements of one benchmark across rounds.
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Measurement> + 'a {
        self.measurements().filter(move |m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(name: &str, elapsed_ns: f64, iters: u64) -> Measurement {
        Measurement {
            name: name.to_string(),
            iters_total: iters,
            iters_complete: iters,
            elapsed_ns,
            elapsed_err_ns: 20.0,
        }
    }

    #[test]
    fn test_per_iter() {
        let m = measurement("add", 5_000.0, 1_000);
        assert_eq!(m.per_iter_ns(), 5.0);
        assert_eq!(m.per_iter_err_ns(), 0.02);
    }

    #[test]
    fn test_per_iter_without_iterations() {
        let m = measurement("none", 5_000.0, 0);
        assert_eq!(m.per_iter_ns(), 0.0);
        assert_eq!(m.per_iter_err_ns(), 0.0);
    }

    #[test]
    fn test_by_name() {
        let report = SuiteReport {
            timer: TimerInfo {
                name: "simulated".to_string(),
                precision_ns: 1,
                get_cost_ns: 0.0,
                instr_err_ns: 2.0,
            },
            baseline: measurement("empty-loop", 100.0, 100),
            loop_cost_per_iter_ns: 1.0,
            loop_cost_err_per_iter_ns: 0.02,
            rounds: vec![
                vec![measurement("a", 1.0, 1), measurement("b", 2.0, 1)],
                vec![measurement("a", 3.0, 1), measurement("b", 4.0, 1)],
            ],
        };
        let a: Vec<f64> = report.by_name("a").map(|m| m.elapsed_ns).collect();
        assert_eq!(a, vec![1.0, 3.0]);
        assert_eq!(report.measurements().count(), 4);
    }
}
