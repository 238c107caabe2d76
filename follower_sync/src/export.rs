//! CSV export of the observation series
//!
//! The service publishes its data as a `Date,Count` CSV download. This module
//! hands out the reference to that resource, retrieves it, and reads or writes
//! the same format locally.

use crate::error::{Result, TrackerError};
use crate::remote::RemoteCollaborator;
use chrono::NaiveDate;
use growth_math::deltas::sort_chronologically;
use growth_math::Entry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// One CSV row
#[derive(Debug, Serialize, Deserialize)]
struct ExportRow {
    #[serde(rename = "Date", alias = "date")]
    date: NaiveDate,
    #[serde(rename = "Count", alias = "count", alias = "followers", alias = "Followers")]
    count: u64,
}

impl From<ExportRow> for Entry {
    fn from(row: ExportRow) -> Self {
        Entry::new(row.date, row.count)
    }
}

impl From<&Entry> for ExportRow {
    fn from(entry: &Entry) -> Self {
        Self {
            date: entry.date,
            count: entry.count,
        }
    }
}

/// Loader for exported entry files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load entries from a CSV file on disk
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Entry>> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load entries from any CSV source. Rows come back in date order.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Entry>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for row in csv_reader.deserialize::<ExportRow>() {
            entries.push(Entry::from(row?));
        }
        Ok(sort_chronologically(&entries))
    }

    pub fn from_text(text: &str) -> Result<Vec<Entry>> {
        Self::from_reader(text.as_bytes())
    }
}

/// Write entries as `Date,Count` CSV
pub fn write_csv<W: Write>(writer: W, entries: &[Entry]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if entries.is_empty() {
        csv_writer.write_record(["Date", "Count"])?;
    }
    for entry in entries {
        csv_writer.serialize(ExportRow::from(entry))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write entries to a CSV file, replacing it if present
pub fn save_csv<P: AsRef<Path>>(path: P, entries: &[Entry]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv(file, entries)?;
    info!(path = %path.as_ref().display(), rows = entries.len(), "export written");
    Ok(())
}

/// Reference to the service's export resource
pub fn export_url<R>(remote: &R) -> Result<String>
where
    R: RemoteCollaborator + ?Sized,
{
    remote
        .export_url()
        .ok_or_else(|| TrackerError::Config("this remote has no export resource".to_string()))
}

/// Retrieve the export resource and parse it into entries
pub async fn download<R>(remote: &R) -> Result<Vec<Entry>>
where
    R: RemoteCollaborator + ?Sized,
{
    let text = remote.export_csv().await?;
    debug!(bytes = text.len(), "export retrieved");
    DataLoader::from_text(&text)
}
