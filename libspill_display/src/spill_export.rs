use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::constants::{SPILL_CLOCK_COLUMN, SPILL_EVENT_COLUMN, SPILL_VARIABLE_COLUMN};
use super::error::SpillExportError;

/// One start-of-extraction reading from the beam server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillEvent {
    /// UTC milliseconds
    pub clock_ms: i64,
    pub event: String,
    pub variable: String,
    /// Data row number in the export, starting at 1
    pub row: u64,
}

/// The beam server writes Clock either as an integer or as a float with a trailing `.0`
fn parse_clock(value: &str) -> Option<i64> {
    if let Ok(ms) = value.parse::<i64>() {
        return Some(ms);
    }
    let ms = value.parse::<f64>().ok()?;
    if ms.is_finite() {
        Some(ms.round() as i64)
    } else {
        None
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, SpillExportError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| SpillExportError::MissingColumn(name.to_string()))
}

/// Parse a beam spill export.
///
/// If `header` is given it is used as the column names and the first line of the data is treated
/// as a data row. The `Event`, `Variable` and `Clock` columns must be present, otherwise nothing is
/// classified at all. Rows whose clock cannot be read are skipped with a warning.
pub fn parse_spill_export<R: Read>(
    reader: R,
    header: Option<&[String]>,
) -> Result<Vec<SpillEvent>, SpillExportError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(header.is_none())
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = match header {
        Some(names) => {
            let record = StringRecord::from(names.to_vec());
            csv_reader.set_headers(record.clone());
            record
        }
        None => csv_reader.headers()?.clone(),
    };

    let event_idx = column_index(&headers, SPILL_EVENT_COLUMN)?;
    let variable_idx = column_index(&headers, SPILL_VARIABLE_COLUMN)?;
    let clock_idx = column_index(&headers, SPILL_CLOCK_COLUMN)?;

    let mut events = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = row as u64 + 1;
        let clock = record.get(clock_idx).unwrap_or("");
        match parse_clock(clock) {
            Some(clock_ms) => events.push(SpillEvent {
                clock_ms,
                event: record.get(event_idx).unwrap_or("").to_string(),
                variable: record.get(variable_idx).unwrap_or("").to_string(),
                row,
            }),
            None => spdlog::warn!("Skipping beam export row {row}: unreadable Clock '{clock}'"),
        }
    }

    Ok(events)
}

/// Read a beam spill export from disk. See [`parse_spill_export`].
pub fn read_spill_export(
    path: &Path,
    header: Option<&[String]>,
) -> Result<Vec<SpillEvent>, SpillExportError> {
    if !path.exists() {
        return Err(SpillExportError::BadFilePath(path.to_path_buf()));
    }
    let events = parse_spill_export(File::open(path)?, header)?;
    spdlog::info!(
        "Read {} spill extractions from {}",
        events.len(),
        path.display()
    );
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let text = "Event,Variable,Clock,Value\n1,XBH4.XTDC,1000,1\n2,XBH4.XTDC,5000.0,1\n3,XBH4.XTDC,oops,1\n";
        let events = parse_spill_export(text.as_bytes(), None).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].clock_ms, 1000);
        assert_eq!(events[1].clock_ms, 5000);
        assert_eq!(events[1].variable, "XBH4.XTDC");
        assert_eq!(events[1].row, 2);
    }

    #[test]
    fn test_missing_header_fails_naming_column() {
        let text = "1,XBH4.XTDC,1000\n2,XBH4.XTDC,5000\n";
        match parse_spill_export(text.as_bytes(), None) {
            Err(SpillExportError::MissingColumn(name)) => assert_eq!(name, "Event"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn test_injected_header() {
        let text = "1,XBH4.XTDC,1000\n2,XBH4.XTDC,5000\n";
        let header: Vec<String> = ["Event", "Variable", "Clock"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let events = parse_spill_export(text.as_bytes(), Some(&header)).unwrap();
        let clocks: Vec<i64> = events.iter().map(|e| e.clock_ms).collect();
        assert_eq!(clocks, vec![1000, 5000]);
        assert_eq!(events[0].event, "1");
    }

    #[test]
    fn test_missing_file() {
        let result = read_spill_export(Path::new("/no/spill.csv"), None);
        assert!(matches!(result, Err(SpillExportError::BadFilePath(_))));
    }
}
