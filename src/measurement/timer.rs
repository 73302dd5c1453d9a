//! A clock source paired with its calibration state.

use std::hint::black_box as std_black_box;

use super::calibration::{calibrate, Calibration, CalibrationConfig};
use super::clock::{ClockSource, CycleClock, MonotonicClock};
use crate::error::{BenchError, Result};
use crate::result::TimerInfo;

/// Wrapper around `std::hint::black_box`.
///
/// Pass benchmark inputs and results through this so the optimizer can
/// neither precompute nor discard the measured work.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// A clock and, once calibrated, its precision and instrumentation error.
///
/// Benchmarks refuse to run against a timer whose calibration is missing.
pub struct Timer {
    clock: Box<dyn ClockSource>,
    calibration: Option<Calibration>,
}

impl Timer {
    /// Wrap a clock. The timer starts uncalibrated.
    pub fn new<C>(clock: C) -> Self
    where
        C: ClockSource + 'static,
    {
        Self {
            clock: Box::new(clock),
            calibration: None,
        }
    }

    /// Wrap a clock and calibrate it with default settings.
    pub fn calibrated<C>(clock: C) -> Result<Self>
    where
        C: ClockSource + 'static,
    {
        let mut timer = Self::new(clock);
        timer.calibrate()?;
        Ok(timer)
    }

    /// Calibrated [`MonotonicClock`] timer.
    pub fn monotonic() -> Result<Self> {
        Self::calibrated(MonotonicClock::new())
    }

    /// Calibrated [`CycleClock`] timer.
    pub fn cycle() -> Result<Self> {
        Self::calibrated(CycleClock::new())
    }

    /// Clock name.
    pub fn name(&self) -> &str {
        self.clock.name()
    }

    /// Read the underlying clock.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    /// Resolution reported by the underlying clock.
    pub fn precision_ns(&self) -> u64 {
        self.clock.precision_ns()
    }

    /// Run calibration with default settings.
    ///
    /// On failure any previous calibration is discarded.
    pub fn calibrate(&mut self) -> Result<&Calibration> {
        self.calibrate_with(&CalibrationConfig::default())
    }

    /// Run calibration with explicit settings.
    pub fn calibrate_with(&mut self, config: &CalibrationConfig) -> Result<&Calibration> {
        self.calibration = None;
        let calibration = calibrate(self.clock.as_ref(), config)?;
        Ok(&*self.calibration.insert(calibration))
    }

    /// Calibration result, if calibration succeeded.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Whether the timer may be used for measurement.
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Calibration result, or [`BenchError::UncalibratedClock`].
    pub fn require_calibrated(&self) -> Result<&Calibration> {
        self.calibration
            .as_ref()
            .ok_or_else(|| BenchError::UncalibratedClock {
                clock: self.name().to_string(),
            })
    }

    /// Summary for reports. `None` until calibrated.
    pub fn info(&self) -> Option<TimerInfo> {
        self.calibration.as_ref().map(|c| TimerInfo {
            name: self.name().to_string(),
            precision_ns: c.precision_ns,
            get_cost_ns: c.get_cost_ns,
            instr_err_ns: c.instr_err,
        })
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name())
            .field("precision_ns", &self.precision_ns())
            .field("calibration", &self.calibration)
            .finish()
    }
}
