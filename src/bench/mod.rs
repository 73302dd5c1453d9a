//! Benchmark registration, the iteration counter, and the adaptive runner.

mod counter;
mod registry;
mod runner;

pub use counter::{Attempt, Bencher, CounterState, MAX_ITERS};
pub use registry::{BenchId, Benchmark, Suite};
pub use runner::{subtract_baseline, RunEvent, Runner};
