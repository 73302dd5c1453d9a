//! Rendering of suite reports.

pub mod json;
pub mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_event, format_preamble, format_report, print_event, print_preamble};
