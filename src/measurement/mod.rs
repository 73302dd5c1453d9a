//! Clock sources and their calibration.
//!
//! This module provides:
//! - The `ClockSource` trait with monotonic, cycle-counter and simulated clocks
//! - Calibration of a clock's read cost and instrumentation error
//! - `Timer`, which pairs a clock with its calibration
//!
//! # Clock Selection
//!
//! `Timer::monotonic()` uses `std::time::Instant` and works everywhere.
//! `Timer::cycle()` reads the CPU counter directly:
//! - **x86_64**: `lfence; rdtsc`
//! - **aarch64**: `isb; mrs cntvct_el0` (resolution varies by SoC, ~42ns on Apple Silicon)
//!
//! Both reads are fenced against compiler reordering so that the start and
//! stop reads of a timed region stay in program order around the workload.

mod calibration;
mod clock;
mod timer;

pub use calibration::{calibrate, Calibration, CalibrationConfig};
pub use clock::{cycles_per_ns, read_cycles, ClockSource, CycleClock, MonotonicClock, SimulatedClock};
pub use timer::{black_box, Timer};
