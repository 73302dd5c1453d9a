//! JSON serialization for suite reports.

use crate::result::SuiteReport;

/// Serialize a report to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for SuiteReport).
pub fn to_json(report: &SuiteReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a report to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for SuiteReport).
pub fn to_json_pretty(report: &SuiteReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Parse a report previously written by [`to_json`] or [`to_json_pretty`].
pub fn from_json(json: &str) -> Result<SuiteReport, serde_json::Error> {
    serde_json::from_str(json)
}
