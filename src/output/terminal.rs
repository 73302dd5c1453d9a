//! Terminal tables for timers and benchmark results.

use colored::Colorize;

use crate::bench::RunEvent;
use crate::config::Config;
use crate::result::{Measurement, SuiteReport, TimerInfo};

const UNITS: [&str; 4] = ["ns", "us", "ms", "s"];

/// Scale a nanosecond value to the largest unit that keeps it at or below 1000.
pub fn scale_ns(ns: f64) -> (f64, &'static str) {
    let mut value = ns;
    let mut unit = 0;
    while value > 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    (value, UNITS[unit])
}

/// Timer table: name, precision, read cost and instrumentation error.
pub fn format_timer(timer: &TimerInfo) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{}\n",
        "[t]      TIMER  PRECISION   GET-COST      ERROR".bold()
    ));
    output.push_str(&format!(
        "[t] {:>10} {:>8}ns {:>8.0}ns {:>8.3}ns\n",
        timer.name, timer.precision_ns, timer.get_cost_ns, timer.instr_err_ns
    ));
    output.push_str("[t] --------------------------------\n");
    output
}

/// Header line for benchmark rows.
pub fn format_header() -> String {
    format!(
        "{}\n",
        "[b]       NAME      ITERS       TIME                 TIME/iter".bold()
    )
}

/// One benchmark row: iterations, total seconds, scaled time per iteration
/// and per-iteration error.
pub fn format_measurement(m: &Measurement) -> String {
    let (per_iter, unit) = scale_ns(m.per_iter_ns());
    format!(
        "[b] {:>10} {:>10} {:>10.4} {:>10.4}{} {}\n",
        m.name.bold(),
        m.iters_complete,
        m.elapsed_ns / 1e9,
        per_iter,
        unit,
        format!("err {:6.4}ns", m.per_iter_err_ns()).dimmed()
    )
}

/// Lines printed before any benchmark runs: the timer table if
/// `print_timers` is set, then the row header.
pub fn format_preamble(timer: &TimerInfo, config: &Config) -> String {
    let mut output = String::new();
    if config.print_timers {
        output.push_str(&format_timer(timer));
    }
    output.push_str(&format_header());
    output
}

/// Row for a progress event, or `None` if the event is not printed.
pub fn format_event(event: &RunEvent<'_>, config: &Config) -> Option<String> {
    match event {
        RunEvent::Baseline(m) if config.print_empty_loop_baseline => Some(format_measurement(m)),
        RunEvent::Baseline(_) => None,
        RunEvent::Measured { measurement, .. } => Some(format_measurement(measurement)),
    }
}

/// Full suite report, honoring the `print_timers` and
/// `print_empty_loop_baseline` flags.
pub fn format_report(report: &SuiteReport, config: &Config) -> String {
    let mut output = format_preamble(&report.timer, config);
    if let Some(row) = format_event(&RunEvent::Baseline(&report.baseline), config) {
        output.push_str(&row);
    }
    for m in report.measurements() {
        output.push_str(&format_measurement(m));
    }
    output
}

/// Write [`format_preamble`] to stderr.
pub fn print_preamble(timer: &TimerInfo, config: &Config) {
    eprint!("{}", format_preamble(timer, config));
}

/// Write the row for `event`, if any, to stderr.
pub fn print_event(event: &RunEvent<'_>, config: &Config) {
    if let Some(row) = format_event(event, config) {
        eprint!("{}", row);
    }
}
