//! Output module for persisting scrape results
//!
//! This module handles:
//! - The sink interface the pipeline hands its collection to
//! - JSON and CSV sinks
//! - Run summaries and their display

mod csv;
mod json;
pub mod stats;
mod traits;

pub use self::csv::{to_csv_string, write_records, CsvSink, COLUMNS};
pub use json::JsonSink;
pub use stats::print_summary;
pub use traits::{RunSummary, Sink};

use crate::config::OutputConfig;
use std::path::Path;

/// Builds the configured sinks, JSON first
pub fn sinks_from_config(config: &OutputConfig) -> (JsonSink, CsvSink) {
    (
        JsonSink::new(&config.json_path),
        CsvSink::new(&config.csv_path),
    )
}

/// Creates the parent directory of `path` if it is missing
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
