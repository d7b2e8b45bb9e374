use fxhash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::constants::*;
use super::error::ExtractorError;
use super::record::{Primitive, RawRecordEntry, RecordBlock};
use super::run_info::RunInfo;

/// Something that can turn a raw data file into the text dump of its records.
///
/// The vendor dump tool is an external process; implementors decide how its output is obtained.
pub trait RawDumpSource {
    fn open_dump(&self, path: &Path) -> Result<Box<dyn BufRead + Send>, ExtractorError>;
}

/// Reads dumps that were already written to disk, one text file per raw file
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpFileSource;

impl RawDumpSource for DumpFileSource {
    fn open_dump(&self, path: &Path) -> Result<Box<dyn BufRead + Send>, ExtractorError> {
        if !path.exists() {
            return Err(ExtractorError::BadFilePath(path.to_path_buf()));
        }
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Split a comma delimited description into its labeled sub-fields.
///
/// Each segment contributes its last `key: value` pair; free text before the key is dropped, so
/// `Trigger record header: trigger_number: 43` yields `trigger_number -> 43`.
pub fn parse_labeled_fields(line: &str) -> FxHashMap<&str, &str> {
    let mut fields = FxHashMap::default();
    for segment in line.split(',') {
        let Some((label, value)) = segment.rsplit_once(':') else {
            continue;
        };
        let key = label
            .rsplit(|c: char| c == ':' || c.is_whitespace())
            .find(|s| !s.is_empty());
        if let Some(key) = key {
            fields.insert(key, value.trim());
        }
    }
    fields
}

/// Parse an unsigned value, accepting a hex `0x` prefix as the dump tool prints some of them that way
fn parse_unsigned(value: &str) -> Option<u64> {
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

fn required(fields: &FxHashMap<&str, &str>, key: &str) -> Result<u64, String> {
    match fields.get(key) {
        Some(v) => parse_unsigned(v).ok_or_else(|| format!("{key} has unparsable value '{v}'")),
        None => Err(format!("missing {key}")),
    }
}

fn optional(fields: &FxHashMap<&str, &str>, key: &str) -> Result<u64, String> {
    match fields.get(key) {
        Some(_) => required(fields, key),
        None => Ok(0),
    }
}

fn is_record_header(fields: &FxHashMap<&str, &str>) -> bool {
    fields.contains_key(TRIGGER_NUMBER_KEY)
        || fields.contains_key(TRIGGER_TIMESTAMP_KEY)
        || fields.contains_key(TRIGGER_TYPE_KEY)
}

fn is_primitive(fields: &FxHashMap<&str, &str>) -> bool {
    fields.contains_key(TP_CHANNEL_KEY) || fields.contains_key(TP_TIME_START_KEY)
}

fn parse_header(fields: &FxHashMap<&str, &str>, run_info: &RunInfo) -> Result<RawRecordEntry, String> {
    let trigger_id = required(fields, TRIGGER_NUMBER_KEY)?;
    let timestamp = required(fields, TRIGGER_TIMESTAMP_KEY)?;
    let trigger_type = required(fields, TRIGGER_TYPE_KEY)?;
    let trigger_type =
        u32::try_from(trigger_type).map_err(|_| format!("trigger_type {trigger_type} out of range"))?;
    Ok(RawRecordEntry {
        run: run_info.run,
        subrun: run_info.subrun,
        trigger_type,
        trigger_id,
        timestamp,
    })
}

fn parse_primitive(fields: &FxHashMap<&str, &str>, tick_ns: u64) -> Result<Primitive, String> {
    let channel = required(fields, TP_CHANNEL_KEY)?;
    let channel = u32::try_from(channel).map_err(|_| format!("channel {channel} out of range"))?;
    let detid = optional(fields, TP_DETID_KEY)?;
    Ok(Primitive {
        channel,
        time_start_ns: required(fields, TP_TIME_START_KEY)?.saturating_mul(tick_ns),
        time_peak_ns: optional(fields, TP_TIME_PEAK_KEY)?.saturating_mul(tick_ns),
        time_over_threshold_ns: optional(fields, TP_TIME_OVER_THRESHOLD_KEY)?
            .saturating_mul(tick_ns),
        adc_integral: optional(fields, TP_ADC_INTEGRAL_KEY)?,
        adc_peak: optional(fields, TP_ADC_PEAK_KEY)?,
        detid: u16::try_from(detid).unwrap_or(u16::MAX),
    })
}

/// Bookkeeping of what the extractor did with the stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractorStats {
    pub parsed: u64,
    pub skipped: u64,
    pub filtered_out: u64,
    pub primitives: u64,
    pub skipped_primitives: u64,
}

#[derive(Debug)]
enum PendingBlock {
    Keep(RecordBlock),
    Discard,
}

/// Lazily pulls trigger record blocks of one trigger type out of a raw dump stream.
///
/// Malformed blocks are logged and skipped; they never end the stream. Run and subrun are taken
/// once from the name of the source file.
pub struct RecordExtractor<R: BufRead> {
    reader: R,
    source_name: String,
    run_info: RunInfo,
    trigger_type: u32,
    tick_ns: u64,
    line: String,
    line_number: usize,
    current: Option<PendingBlock>,
    is_ended: bool,
    stats: ExtractorStats,
}

impl RecordExtractor<Box<dyn BufRead + Send>> {
    /// Open the dump of a raw file through the given source
    pub fn open(
        source: &dyn RawDumpSource,
        path: &Path,
        trigger_type: u32,
        tick_ns: u64,
    ) -> Result<Self, ExtractorError> {
        let reader = source.open_dump(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(reader, &name, trigger_type, tick_ns))
    }
}

impl<R: BufRead> RecordExtractor<R> {
    pub fn new(reader: R, source_name: &str, trigger_type: u32, tick_ns: u64) -> Self {
        let run_info = RunInfo::from_file_name(source_name);
        if run_info.run.is_none() || run_info.subrun.is_none() {
            spdlog::warn!(
                "Could not derive run/subrun from file name {source_name}; records will carry unknown values"
            );
        }
        Self {
            reader,
            source_name: source_name.to_string(),
            run_info,
            trigger_type,
            tick_ns,
            line: String::new(),
            line_number: 0,
            current: None,
            is_ended: false,
            stats: ExtractorStats::default(),
        }
    }

    pub fn run_info(&self) -> &RunInfo {
        &self.run_info
    }

    pub fn stats(&self) -> &ExtractorStats {
        &self.stats
    }

    /// Get the next complete record block matching the trigger type filter
    ///
    /// Returns a `Result<Option<RecordBlock>>`. The Option is None once the stream is exhausted.
    pub fn get_next_block(&mut self) -> Result<Option<RecordBlock>, ExtractorError> {
        loop {
            if self.is_ended {
                return Ok(None);
            }

            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                self.is_ended = true;
                return Ok(self.take_current());
            }
            self.line_number += 1;

            let line = std::mem::take(&mut self.line);
            let finished = self.consume_line(&line);
            self.line = line;
            if finished.is_some() {
                return Ok(finished);
            }
        }
    }

    fn take_current(&mut self) -> Option<RecordBlock> {
        match self.current.take() {
            Some(PendingBlock::Keep(block)) => Some(block),
            _ => None,
        }
    }

    /// Handle one line. Returns the previous block if this line closed it.
    fn consume_line(&mut self, line: &str) -> Option<RecordBlock> {
        let fields = parse_labeled_fields(line);
        if is_record_header(&fields) {
            let finished = self.take_current();
            self.current = Some(self.open_block(&fields));
            finished
        } else if is_primitive(&fields) {
            self.push_primitive(&fields);
            None
        } else {
            None
        }
    }

    fn check_run_number(&self, fields: &FxHashMap<&str, &str>) {
        let Some(file_run) = self.run_info.run else {
            return;
        };
        if let Some(dump_run) = fields.get(RUN_NUMBER_KEY).and_then(|v| parse_unsigned(v)) {
            if dump_run != file_run as u64 {
                spdlog::warn!(
                    "{}:{} says run_number {dump_run} but the file name says run {file_run}; using {file_run}",
                    self.source_name,
                    self.line_number
                );
            }
        }
    }

    fn open_block(&mut self, fields: &FxHashMap<&str, &str>) -> PendingBlock {
        self.check_run_number(fields);
        match parse_header(fields, &self.run_info) {
            Ok(entry) if entry.trigger_type == self.trigger_type => {
                self.stats.parsed += 1;
                PendingBlock::Keep(RecordBlock {
                    entry,
                    primitives: Vec::new(),
                })
            }
            Ok(_) => {
                self.stats.filtered_out += 1;
                PendingBlock::Discard
            }
            Err(reason) => {
                self.stats.skipped += 1;
                spdlog::warn!(
                    "Skipping malformed record block at {}:{}: {reason}",
                    self.source_name,
                    self.line_number
                );
                PendingBlock::Discard
            }
        }
    }

    fn push_primitive(&mut self, fields: &FxHashMap<&str, &str>) {
        match &mut self.current {
            Some(PendingBlock::Keep(block)) => match parse_primitive(fields, self.tick_ns) {
                Ok(tp) => {
                    self.stats.primitives += 1;
                    block.primitives.push(tp);
                }
                Err(reason) => {
                    self.stats.skipped_primitives += 1;
                    spdlog::warn!(
                        "Skipping malformed primitive at {}:{}: {reason}",
                        self.source_name,
                        self.line_number
                    );
                }
            },
            Some(PendingBlock::Discard) => (),
            None => {
                self.stats.skipped_primitives += 1;
                spdlog::warn!(
                    "Primitive at {}:{} does not belong to any record block",
                    self.source_name,
                    self.line_number
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FILE_NAME: &str = "np04hd_raw_run027396_0002_dataflow0_datawriter_0.txt";

    fn extractor(text: &str) -> RecordExtractor<Cursor<Vec<u8>>> {
        RecordExtractor::new(Cursor::new(text.as_bytes().to_vec()), FILE_NAME, 8, 16)
    }

    fn drain<R: BufRead>(ex: &mut RecordExtractor<R>) -> Vec<RecordBlock> {
        let mut blocks = Vec::new();
        while let Some(block) = ex.get_next_block().unwrap() {
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn test_labeled_fields() {
        let fields = parse_labeled_fields(
            "Trigger record header: trigger_number: 43, trigger_timestamp: 0x10, trigger_type: 8",
        );
        assert_eq!(fields.get("trigger_number"), Some(&"43"));
        assert_eq!(fields.get("trigger_timestamp"), Some(&"0x10"));
        assert_eq!(fields.get("trigger_type"), Some(&"8"));
        assert_eq!(parse_unsigned("0x10"), Some(16));
    }

    #[test]
    fn test_blocks_with_primitives() {
        let text = "\
Trigger record header: trigger_number: 1, trigger_timestamp: 100, trigger_type: 8
  Trigger primitive: channel: 7300, time_start: 101, adc_integral: 500
  Trigger primitive: channel: 7301, time_start: 102, adc_integral: 20, adc_peak: 7
Trigger record header: trigger_type: 8, run_number: 27396, trigger_number: 2, trigger_timestamp: 200
";
        let mut ex = extractor(text);
        let first = ex.get_next_block().unwrap().unwrap();
        assert_eq!(first.entry.trigger_id, 1);
        assert_eq!(first.entry.run, Some(27396));
        assert_eq!(first.entry.subrun, Some(2));
        assert_eq!(first.primitives.len(), 2);
        assert_eq!(first.primitives[0].time_start_ns, 101 * 16);
        assert_eq!(first.primitives[1].adc_peak, 7);

        let second = ex.get_next_block().unwrap().unwrap();
        assert_eq!(second.entry.trigger_id, 2);
        assert_eq!(second.entry.timestamp, 200);
        assert!(second.primitives.is_empty());
        assert!(ex.get_next_block().unwrap().is_none());
        assert_eq!(ex.stats().parsed, 2);
    }

    #[test]
    fn test_filter_and_malformed() {
        let text = "\
trigger_number: 1, trigger_timestamp: 100, trigger_type: 2
  channel: 1, time_start: 5
trigger_number: 2, trigger_type: 8
  channel: 1, time_start: 5
trigger_number: 3, trigger_timestamp: abc, trigger_type: 8
trigger_number: 4, trigger_timestamp: 400, trigger_type: 8
  channel: 1
  channel: 2, time_start: 401
";
        let mut ex = extractor(text);
        let blocks = drain(&mut ex);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].entry.trigger_id, 4);
        assert_eq!(blocks[0].primitives.len(), 1);
        let stats = ex.stats();
        assert_eq!(stats.filtered_out, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.skipped_primitives, 1);
    }

    #[test]
    fn test_orphan_primitive_and_unknown_run() {
        let text = "channel: 3, time_start: 9\ntrigger_number: 5, trigger_timestamp: 50, trigger_type: 8\n";
        let mut ex = RecordExtractor::new(Cursor::new(text.as_bytes().to_vec()), "dump.txt", 8, 16);
        let blocks = drain(&mut ex);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].entry.run, None);
        assert_eq!(blocks[0].entry.subrun, None);
        assert_eq!(ex.stats().skipped_primitives, 1);
    }

    #[test]
    fn test_file_name_run_wins() {
        let text = "trigger_number: 7, trigger_timestamp: 70, trigger_type: 8, run_number: 11\n";
        let mut ex = extractor(text);
        let blocks = drain(&mut ex);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].entry.run, Some(27396));
        assert_eq!(blocks[0].entry.trigger_id, 7);
    }

    #[test]
    fn test_missing_dump_file() {
        let result = DumpFileSource.open_dump(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(ExtractorError::BadFilePath(_))));
    }
}
