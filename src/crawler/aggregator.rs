//! Shared result collection
//!
//! Page tasks append their records here concurrently. Appends are the only
//! writes; the collection is read once, after every task has resolved.

use crate::crawler::extractor::Record;
use std::sync::{Arc, Mutex, PoisonError};

/// Concurrently appendable collection of records
///
/// Cloning yields another handle to the same collection. No ordering across
/// pages is kept.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    records: Arc<Mutex<Vec<Record>>>,
}

impl Aggregator {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one page's records
    pub fn add(&self, records: Vec<Record>) {
        if records.is_empty() {
            return;
        }
        let mut all = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        all.extend(records);
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the collected records, leaving the collection empty
    ///
    /// Other handles still alive keep working and see an empty collection.
    pub fn into_records(self) -> Vec<Record> {
        let mut all = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *all)
    }
}
