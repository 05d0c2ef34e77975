//! CSV record sink
//!
//! Writes one file per site run, named `<site>_<YYYY-MM-DD>.csv`, with the
//! columns `page,name,role,phone,email,profile_url`. Values are written
//! exactly as extracted; only CSV quoting is applied.

use crate::crawler::DetailRecord;
use crate::output::traits::{OutputResult, RecordSink};
use chrono::{Local, NaiveDate};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column header, in output order
pub const CSV_HEADER: [&str; 6] = ["page", "name", "role", "phone", "email", "profile_url"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Record sink producing dated CSV files in a directory
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
    bom: bool,
    date: Option<NaiveDate>,
}

impl CsvSink {
    /// Creates a sink writing into `directory`
    ///
    /// # Arguments
    ///
    /// * `directory` - Created on first write if missing
    /// * `bom` - Prefix files with a UTF-8 byte order mark
    pub fn new(directory: impl Into<PathBuf>, bom: bool) -> Self {
        Self {
            directory: directory.into(),
            bom,
            date: None,
        }
    }

    /// Pins the date used in file names instead of today's
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Path the records of `site` will be written to
    pub fn path_for(&self, site: &str) -> PathBuf {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        self.directory
            .join(format!("{}_{}.csv", site, date.format("%Y-%m-%d")))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl RecordSink for CsvSink {
    fn write_records(&self, site: &str, records: &[DetailRecord]) -> OutputResult<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;

        let path = self.path_for(site);
        let mut file = File::create(&path)?;
        if self.bom {
            file.write_all(UTF8_BOM)?;
        }
        write_csv(file, records)?;

        tracing::debug!(site, path = %path.display(), rows = records.len(), "Wrote CSV output");
        Ok(path)
    }
}

/// Writes records as CSV (header included) to any writer
pub fn write_csv<W: Write>(writer: W, records: &[DetailRecord]) -> OutputResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for record in records {
        let page = record.source_page.to_string();
        csv_writer.write_record([
            page.as_str(),
            record.name.as_str(),
            record.role.as_str(),
            record.phone.as_str(),
            record.email.as_str(),
            record.profile_url.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
