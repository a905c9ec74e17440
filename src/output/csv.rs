//! Flat tabular sink
//!
//! One header row plus one row per record, columns in fixed order.
//! Missing values are written as empty cells.

use crate::crawler::Record;
use crate::output::ensure_parent_dir;
use crate::output::traits::Sink;
use crate::ScrapeError;
use ::csv::{Writer, WriterBuilder};
use std::io;
use std::path::{Path, PathBuf};

/// Column order of the tabular output
pub const COLUMNS: [&str; 5] = ["title", "price", "rating", "availability", "productUrl"];

/// Writes records as comma-separated rows
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
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

impl Sink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&self, records: &[Record]) -> Result<(), ScrapeError> {
        ensure_parent_dir(&self.path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        write_records(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }
}

/// Renders records as CSV text, header first
pub fn to_csv_string(records: &[Record]) -> Result<String, ScrapeError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    write_records(&mut writer, records)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ScrapeError::Io(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| ScrapeError::Sink {
        sink: "csv".to_string(),
        message: e.to_string(),
    })
}

/// Writes the header and one row per record
///
/// The header comes from `COLUMNS`; rows are serialized from `Record`,
/// whose field order matches it.
pub fn write_records<W: io::Write>(
    writer: &mut Writer<W>,
    records: &[Record],
) -> Result<(), ::csv::Error> {
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    Ok(())
}
