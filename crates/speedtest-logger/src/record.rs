use crate::{constants::TIMESTAMP_FORMAT, error::ParseError};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

/// Number of columns the measurement utility emits per line
pub const UTILITY_FIELD_COUNT: usize = 20;

/// Dataset header: the utility's fixed column order followed by `Timestamp`
pub const DATASET_HEADER: [&str; UTILITY_FIELD_COUNT + 1] = [
    "Server Name",
    "Server ID",
    "Latency",
    "Jitter",
    "Packet Loss",
    "Download",
    "Upload",
    "Download Bytes",
    "Upload Bytes",
    "Share URL",
    "Download Server Count",
    "Download Latency",
    "Download Latency Jitter",
    "Download Latency Low",
    "Download Latency High",
    "Upload Latency",
    "Upload Latency Jitter",
    "Upload Latency Low",
    "Upload Latency High",
    "Idle Latency",
    "Timestamp",
];

/// Column names of a utility line, without the collection timestamp
pub fn utility_fields() -> &'static [&'static str] {
    &DATASET_HEADER[..UTILITY_FIELD_COUNT]
}

/// One speed test as persisted in the dataset.
///
/// Values are kept exactly as the utility printed them; nothing is coerced to
/// a number. Field order is the column order of the dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "Server Name")]
    pub server_name: String,
    #[serde(rename = "Server ID")]
    pub server_id: String,
    #[serde(rename = "Latency")]
    pub latency: String,
    #[serde(rename = "Jitter")]
    pub jitter: String,
    #[serde(rename = "Packet Loss")]
    pub packet_loss: String,
    #[serde(rename = "Download")]
    pub download: String,
    #[serde(rename = "Upload")]
    pub upload: String,
    #[serde(rename = "Download Bytes")]
    pub download_bytes: String,
    #[serde(rename = "Upload Bytes")]
    pub upload_bytes: String,
    #[serde(rename = "Share URL")]
    pub share_url: String,
    #[serde(rename = "Download Server Count")]
    pub download_server_count: String,
    #[serde(rename = "Download Latency")]
    pub download_latency: String,
    #[serde(rename = "Download Latency Jitter")]
    pub download_latency_jitter: String,
    #[serde(rename = "Download Latency Low")]
    pub download_latency_low: String,
    #[serde(rename = "Download Latency High")]
    pub download_latency_high: String,
    #[serde(rename = "Upload Latency")]
    pub upload_latency: String,
    #[serde(rename = "Upload Latency Jitter")]
    pub upload_latency_jitter: String,
    #[serde(rename = "Upload Latency Low")]
    pub upload_latency_low: String,
    #[serde(rename = "Upload Latency High")]
    pub upload_latency_high: String,
    #[serde(rename = "Idle Latency")]
    pub idle_latency: String,
    // Absent from utility output, filled in at collection time
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
}

/// A utility line dropped because its column count was wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: u64,
    pub found: usize,
}

#[derive(Debug, Default)]
pub struct ParsedOutput {
    pub records: Vec<MeasurementRecord>,
    pub rejected: Vec<RejectedLine>,
}

/// Parse raw utility output into timestamped records.
///
/// Every line must carry exactly [`UTILITY_FIELD_COUNT`] fields. Lines that
/// don't are returned in `rejected`; if no line survives and at least one was
/// rejected, the output is treated as structurally malformed. Lines that echo
/// the utility header are skipped, so header-only output parses to nothing.
pub fn parse_output(raw: &str, collected_at: NaiveDateTime) -> Result<ParsedOutput, ParseError> {
    let header = StringRecord::from(utility_fields().to_vec());
    let timestamp = collected_at.format(TIMESTAMP_FORMAT).to_string();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut parsed = ParsedOutput::default();
    for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());

        if row.len() != UTILITY_FIELD_COUNT {
            parsed.rejected.push(RejectedLine {
                line,
                found: row.len(),
            });
            continue;
        }
        if row.iter().eq(utility_fields().iter().copied()) {
            continue;
        }

        let mut record: MeasurementRecord = row.deserialize(Some(&header))?;
        record.timestamp = timestamp.clone();
        parsed.records.push(record);
    }

    if parsed.records.is_empty() {
        if let Some(first) = parsed.rejected.first() {
            return Err(ParseError::FieldCount {
                line: first.line,
                expected: UTILITY_FIELD_COUNT,
                found: first.found,
            });
        }
    }

    Ok(parsed)
}
