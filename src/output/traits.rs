//! Sink trait and run summary types
//!
//! This module defines the interface for persisting a finished collection
//! and the summary reported at the end of a run.

use crate::crawler::Record;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary statistics for a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages scheduled
    pub pages_total: u32,

    /// Pages fetched and extracted
    pub pages_succeeded: u32,

    /// Indices of pages that contributed no records, ascending
    pub failed_pages: Vec<u32>,

    /// Records aggregated across all pages
    pub records: usize,
}

impl RunSummary {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Returns the page success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_total == 0 {
            return 0.0;
        }
        (self.pages_succeeded as f64 / self.pages_total as f64) * 100.0
    }
}

/// Trait for persistence collaborators
///
/// A sink receives the finished collection once, after every page task has
/// resolved, and owns its serialization format.
pub trait Sink {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Persists the collection
    ///
    /// # Arguments
    ///
    /// * `records` - Every record of the run, in no particular order
    fn write(&self, records: &[Record]) -> Result<(), ScrapeError>;
}
