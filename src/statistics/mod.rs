//! Statistical routines for clock calibration.
//!
//! This module provides:
//! - Mean, median and Bessel-corrected standard deviation
//! - 3-sigma outlier trimming with a mean-versus-median normality quicktest
//! - Quadrature combination of independent errors

mod basic;
mod normality;
pub mod quadrature;

pub use basic::{basic_stats, BasicStats};
pub use normality::{
    detect_normal, detect_normal_with, normal_quicktest, Distribution, NormalityReport,
    NormalityTest, TrimPolicy,
};
