//! JSON list-of-objects sink

use crate::crawler::Record;
use crate::output::traits::Sink;
use crate::output::ensure_parent_dir;
use crate::ScrapeError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes records as a pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    /// Creates a sink writing to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the output path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, records: &[Record]) -> Result<(), ScrapeError> {
        ensure_parent_dir(&self.path)?;

        let file = File::create(&self.path)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, records)?;
        writeln!(out)?;
        out.flush()?;

        Ok(())
    }
}
