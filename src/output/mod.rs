//! Rendering and export of screening results

pub mod formatter;
pub mod report;

pub use formatter::{OutputFormatter, ReportGenerator};
