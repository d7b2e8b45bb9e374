use csv::{ReaderBuilder, Trim, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;

use super::error::RecordTableError;
use super::record::TriggerRecord;
use super::spill_matcher::LabeledRecord;

const REQUIRED_COLUMNS: [&str; 4] = ["Run", "Subrun", "Trigger_Record", "Timestamp"];
const SPILL_MODE_COLUMN: &str = "Spill_Mode";

/// One row of the filtered trigger record table. Timestamp is in detector ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RecordRow {
    #[serde(rename = "Run")]
    run: Option<u32>,
    #[serde(rename = "Subrun")]
    subrun: Option<u32>,
    #[serde(rename = "Trigger_Record")]
    trigger_record: u64,
    #[serde(rename = "Timestamp")]
    timestamp: u64,
}

impl RecordRow {
    fn from_record(record: &TriggerRecord, tick_ns: u64) -> Self {
        Self {
            run: record.run,
            subrun: record.subrun,
            trigger_record: record.trigger_id,
            timestamp: record.timestamp_ticks(tick_ns),
        }
    }

    fn into_record(self, tick_ns: u64) -> TriggerRecord {
        TriggerRecord {
            run: self.run,
            subrun: self.subrun,
            trigger_id: self.trigger_record,
            timestamp_ns: self.timestamp.saturating_mul(tick_ns),
        }
    }
}

/// Row of the spill labelled table
#[derive(Debug, Clone, Serialize)]
struct LabeledRow {
    #[serde(rename = "Run")]
    run: Option<u32>,
    #[serde(rename = "Subrun")]
    subrun: Option<u32>,
    #[serde(rename = "Trigger_Record")]
    trigger_record: u64,
    #[serde(rename = "Timestamp")]
    timestamp: u64,
    #[serde(rename = "Spill_Mode")]
    spill_mode: String,
}

/// Append-only writer of the filtered trigger record table.
///
/// The header is written only when the file is new or empty.
pub struct RecordTableWriter {
    writer: Writer<File>,
    tick_ns: u64,
    rows_written: u64,
}

impl RecordTableWriter {
    pub fn open(path: &Path, tick_ns: u64) -> Result<Self, RecordTableError> {
        let has_content = path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if !has_content {
            writer.write_record(REQUIRED_COLUMNS)?;
        }
        Ok(Self {
            writer,
            tick_ns,
            rows_written: 0,
        })
    }

    pub fn write_record(&mut self, record: &TriggerRecord) -> Result<(), RecordTableError> {
        self.writer
            .serialize(RecordRow::from_record(record, self.tick_ns))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and consume the writer
    pub fn close(mut self) -> Result<(), RecordTableError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read the filtered trigger record table. Rows that cannot be read are skipped with a warning.
pub fn read_record_table(path: &Path, tick_ns: u64) -> Result<Vec<TriggerRecord>, RecordTableError> {
    if !path.exists() {
        return Err(RecordTableError::BadFilePath(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(File::open(path)?);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(RecordTableError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<RecordRow>().enumerate() {
        match result {
            Ok(r) => records.push(r.into_record(tick_ns)),
            Err(e) => spdlog::warn!("Skipping row {} of {}: {e}", row + 1, path.display()),
        }
    }
    spdlog::info!("Read {} trigger records from {}", records.len(), path.display());
    Ok(records)
}

/// Write every classified record with its spill mode, in classification order
pub fn write_labeled_table(
    path: &Path,
    labeled: &[LabeledRecord],
    tick_ns: u64,
) -> Result<(), RecordTableError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(REQUIRED_COLUMNS.into_iter().chain([SPILL_MODE_COLUMN]))?;
    for entry in labeled {
        let row = RecordRow::from_record(&entry.record, tick_ns);
        writer.serialize(LabeledRow {
            run: row.run,
            subrun: row.subrun,
            trigger_record: row.trigger_record,
            timestamp: row.timestamp,
            spill_mode: entry.state.to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spill_window::SpillState;

    fn record(run: Option<u32>, trigger_id: u64, ticks: u64) -> TriggerRecord {
        TriggerRecord {
            run,
            subrun: Some(2),
            trigger_id,
            timestamp_ns: ticks * 16,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut writer = RecordTableWriter::open(&path, 16).unwrap();
        writer.write_record(&record(Some(1), 1, 100)).unwrap();
        writer.close().unwrap();

        let mut writer = RecordTableWriter::open(&path, 16).unwrap();
        writer.write_record(&record(None, 2, 200)).unwrap();
        assert_eq!(writer.rows_written(), 1);
        writer.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Run,Subrun,Trigger_Record,Timestamp\n1,2,1,100\n,2,2,200\n");

        let records = read_record_table(&path, 16).unwrap();
        assert_eq!(records, vec![record(Some(1), 1, 100), record(None, 2, 200)]);
    }

    #[test]
    fn test_bad_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(
            &path,
            "Run,Subrun,Trigger_Record,Timestamp\n1,0,1,100\n1,0,x,200\n1,0,3,300\n",
        )
        .unwrap();
        let records = read_record_table(&path, 16).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].trigger_id, 3);
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(&path, "Run,Subrun,Timestamp\n1,0,100\n").unwrap();
        match read_record_table(&path, 16) {
            Err(RecordTableError::MissingColumn(c)) => assert_eq!(c, "Trigger_Record"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_tables_keep_header() {
        let dir = tempfile::tempdir().unwrap();
        let labeled = dir.path().join("labeled.csv");
        write_labeled_table(&labeled, &[], 16).unwrap();
        assert_eq!(
            std::fs::read_to_string(&labeled).unwrap(),
            "Run,Subrun,Trigger_Record,Timestamp,Spill_Mode\n"
        );

        let filtered = dir.path().join("output.csv");
        RecordTableWriter::open(&filtered, 16).unwrap().close().unwrap();
        assert_eq!(
            std::fs::read_to_string(&filtered).unwrap(),
            "Run,Subrun,Trigger_Record,Timestamp\n"
        );
        assert!(read_record_table(&filtered, 16).unwrap().is_empty());
    }

    #[test]
    fn test_labeled_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        let labeled = vec![
            LabeledRecord {
                record: record(Some(1), 1, 100),
                state: SpillState::On,
            },
            LabeledRecord {
                record: record(Some(1), 2, 200),
                state: SpillState::Off,
            },
        ];
        write_labeled_table(&path, &labeled, 16).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Run,Subrun,Trigger_Record,Timestamp,Spill_Mode\n1,2,1,100,ON\n1,2,2,200,OFF\n"
        );
    }
}
