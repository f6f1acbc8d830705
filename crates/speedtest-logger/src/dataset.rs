use crate::record::MeasurementRecord;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{fs::OpenOptions, path::Path};
use tracing::debug;

/// How a batch of records reached the dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The file did not exist before this write
    Created,
    /// Rows were added after the existing contents
    Appended,
}

/// Append `records` to the dataset file at `path`.
///
/// The header row is written only when the file is empty when opened, so a
/// file always carries exactly one header, at the top. Rows go straight to the
/// target in append mode.
pub fn persist(path: &Path, records: &[MeasurementRecord]) -> Result<WriteMode> {
    let existed = path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;
    let needs_header = file
        .metadata()
        .with_context(|| format!("Failed to stat dataset file: {}", path.display()))?
        .len()
        == 0;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write record to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush dataset file: {}", path.display()))?;

    debug!(
        path = %path.display(),
        rows = records.len(),
        header = needs_header,
        "dataset write complete"
    );

    Ok(if existed {
        WriteMode::Appended
    } else {
        WriteMode::Created
    })
}
